use anyhow::Result;

use crate::database::models::{Node, Person};

/// `/people`: public members of each of the person's nodes.
pub async fn handle_people(pool: &sqlx::SqlitePool, nodes: &[Node]) -> Result<String> {
    if nodes.is_empty() {
        return Ok("📍 You're not in any Hacka\\* nodes yet!".to_string());
    }

    let mut sections = Vec::with_capacity(nodes.len());
    for node in nodes {
        let people = match node.group_id {
            Some(group_id) => Some(Person::find_public_in_group(pool, group_id).await?),
            None => None,
        };
        sections.push((node, people));
    }

    Ok(people_text(&sections))
}

/// `None` people means the node has no group.
pub fn people_text(sections: &[(&Node, Option<Vec<Person>>)]) -> String {
    let mut lines = vec!["👥 *People in your nodes:*".to_string(), String::new()];

    for (node, people) in sections {
        lines.push(format!("*{}*", node.display_name()));

        match people {
            None => lines.push("  _No group linked_".to_string()),
            Some(people) if people.is_empty() => lines.push("  _No public profiles yet_".to_string()),
            Some(people) => {
                for person in people {
                    let name = if person.first_name.is_empty() {
                        "Unknown"
                    } else {
                        person.first_name.as_str()
                    };
                    let mut line = format!("  • {}", name);
                    if !person.username_x.is_empty() {
                        line.push_str(&format!(" [@{0}](https://x.com/{0})", person.username_x));
                    }
                    lines.push(line);
                    if !person.bio.is_empty() {
                        lines.push(format!("    _{}_", person.bio));
                    }
                }
            }
        }

        lines.push(String::new());
    }

    lines.push("_Only showing people with privacy mode OFF_".to_string());
    lines.join("\n")
}
