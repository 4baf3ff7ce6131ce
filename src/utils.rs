use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DATA_DIR_NAME: &str = "barostation";

/// Default segment directory under the platform data dir.
pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join(DATA_DIR_NAME))
}

pub async fn ensure_data_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("data path exists but is not a directory: {}", path.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => tokio::fs::create_dir_all(path).await,
        Err(e) => Err(e),
    }
}

/// Formats a countdown as `MM:SS` for a "next update in" display.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_renders_minutes_and_seconds() {
        assert_eq!(format_countdown(Duration::from_secs(300)), "05:00");
        assert_eq!(format_countdown(Duration::from_secs(61)), "01:01");
        assert_eq!(format_countdown(Duration::ZERO), "00:00");
    }
}
