/// Sanitize filename for safe filesystem usage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, spaces, hyphens, underscores, and dots
                c if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' || c == '.' => c,
                // Replace everything else with underscore
                _ => '_',
            }
        })
        .collect::<String>()
        .trim()
        .trim_start_matches('.')
        .to_string()
}

/// Report the external tools that can't be launched
pub async fn check_dependencies(downloader: &str, transcoder: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(downloader).await {
        missing.push(format!("{} - required for video info and downloads", downloader));
    }

    if !check_command_available(transcoder).await {
        missing.push(format!("{} - required for the \"fastest\" mode", transcoder));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    // ffmpeg only understands -version
    let flag = if command.contains("ffmpeg") { "-version" } else { "--version" };

    Command::new(command)
        .arg(flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
