use chrono::NaiveDateTime;

/// Label used when the caller gives an empty task name.
pub const DEFAULT_TASK_LABEL: &str = "当前任务";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Build the notification text: timestamp, task label and body, one per line.
pub fn compose(task_label: &str, body: &str, now: NaiveDateTime) -> String {
    let label = match task_label.trim() {
        "" => DEFAULT_TASK_LABEL,
        trimmed => trimmed,
    };
    format!(
        "时间：{}\n任务：{label}\n{body}",
        now.format(TIMESTAMP_FORMAT)
    )
}
