use anyhow::Result;

use crate::bot::handlers::upsert_person;
use crate::bot::updates::{Poll as PollUpdate, PollAnswer as PollAnswerUpdate};
use crate::database::models::{Poll, PollAnswer, PollState};

/// Counts come from the first two options: yes, then no.
pub fn poll_state(poll: &PollUpdate) -> PollState {
    let (yes_count, no_count) = match poll.options.as_slice() {
        [yes, no, ..] => (yes.voter_count, no.voter_count),
        _ => (0, 0),
    };

    PollState {
        question: poll.question.clone(),
        yes_count,
        no_count,
    }
}

/// Stores the latest state of a poll. `node` is set for polls seen inside a
/// group message and replaces the poll's node.
pub async fn handle_poll(pool: &sqlx::SqlitePool, poll: &PollUpdate, node: Option<Option<i64>>) -> Result<()> {
    if poll.id.is_empty() {
        tracing::warn!("Poll update without id, skipping");
        return Ok(());
    }

    let state = poll_state(poll);
    Poll::upsert_state(pool, &poll.id, &state, node).await?;
    tracing::info!("Poll {} updated: yes={}, no={}", poll.id, state.yes_count, state.no_count);
    Ok(())
}

/// Records one person's vote. The first option means yes; no options means
/// the vote was retracted.
pub async fn handle_poll_answer(pool: &sqlx::SqlitePool, answer: &PollAnswerUpdate) -> Result<()> {
    let Some(user) = answer.user.as_ref().filter(|_| !answer.poll_id.is_empty()) else {
        tracing::warn!("Poll answer without poll id or user, skipping");
        return Ok(());
    };

    let Some(poll) = Poll::find_by_telegram_id(pool, &answer.poll_id).await? else {
        tracing::warn!("Poll {} not found", answer.poll_id);
        return Ok(());
    };

    let person = upsert_person(pool, user).await?;

    match answer.option_ids.first() {
        None => {
            PollAnswer::retract(pool, poll.id, person.id).await?;
            tracing::info!("{} retracted their vote", person.first_name);
        }
        Some(&option) => {
            let yes = option == 0;
            PollAnswer::upsert(pool, poll.id, person.id, yes).await?;
            tracing::info!("{} voted {}", person.first_name, if yes { "yes" } else { "no" });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::updates::PollOption;

    #[test]
    fn test_poll_state_reads_first_two_options() {
        let poll = PollUpdate {
            id: "p1".to_string(),
            question: "Who's coming?".to_string(),
            options: vec![
                PollOption { text: "✅  Yes".to_string(), voter_count: 4 },
                PollOption { text: "👎  Not this week".to_string(), voter_count: 2 },
            ],
        };

        let state = poll_state(&poll);
        assert_eq!(state.yes_count, 4);
        assert_eq!(state.no_count, 2);
        assert_eq!(state.question, "Who's coming?");
    }

    #[test]
    fn test_poll_state_with_missing_options() {
        let poll = PollUpdate {
            options: vec![PollOption { text: "Yes".to_string(), voter_count: 9 }],
            ..Default::default()
        };

        let state = poll_state(&poll);
        assert_eq!((state.yes_count, state.no_count), (0, 0));
    }
}
