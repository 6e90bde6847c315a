use super::IntakeReply;
use crate::poll::NewOption;

/// Parse an `Option text | limit` line.
pub fn parse_option(line: &str) -> Result<NewOption, IntakeReply> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let [text, limit] = parts.as_slice() else {
        return Err(IntakeReply::InvalidFormat);
    };
    if text.is_empty() {
        return Err(IntakeReply::InvalidFormat);
    }
    let limit: i64 = limit.parse().map_err(|_| IntakeReply::InvalidFormat)?;
    if limit < 1 {
        return Err(IntakeReply::LimitTooLow);
    }
    let quota = u32::try_from(limit).map_err(|_| IntakeReply::InvalidFormat)?;
    Ok(NewOption::new(*text, quota))
}
