use tracing::{debug, error, info, warn};

/// Logs an incoming webhook update with consistent format
pub fn log_update_received(kind: &str, chat_id: Option<i64>) {
    match chat_id {
        Some(id) => info!("UPDATE: {} in chat {}", kind, id),
        None => info!("UPDATE: {}", kind),
    }
}

/// Logs command start with consistent format
pub fn log_command_start(command: &str, user: &str, user_id: i64, chat_id: i64) {
    info!(
        "CMD_START: {} by {}({}) in chat {}",
        command, user, user_id, chat_id
    );
}

/// Logs command completion with consistent format
pub fn log_command_success(command: &str, user: &str, user_id: i64, chat_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!(
            "CMD_SUCCESS: {} by {}({}) in chat {} - {}",
            command, user, user_id, chat_id, d
        ),
        None => info!(
            "CMD_SUCCESS: {} by {}({}) in chat {}",
            command, user, user_id, chat_id
        ),
    }
}

/// Logs rejected user input with consistent format
pub fn log_validation_error(command: &str, field: &str, error: &str, user_id: i64) {
    warn!(
        "VALIDATION_ERROR: {} - {} invalid: {} - user {}",
        command, field, error, user_id
    );
}

/// Logs database writes with consistent format
pub fn log_database_operation(operation: &str, table: &str, details: Option<&str>) {
    match details {
        Some(d) => debug!("DB_OP: {} on {} - {}", operation, table, d),
        None => debug!("DB_OP: {} on {}", operation, table),
    }
}

/// Logs worker job outcomes with consistent format
pub fn log_job_sent(job: &str, target: &str) {
    info!("JOB_SENT: {} for {}", job, target);
}

/// Logs worker job failures and reports them to Sentry
pub fn log_job_error(job: &str, target: &str, err: &anyhow::Error) {
    error!("JOB_ERROR: {} for {} failed: {:#}", job, target, err);
    let source: &(dyn std::error::Error + 'static) = err.as_ref();
    sentry::capture_error(source);
}

/// Logs system events with consistent format
pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}
