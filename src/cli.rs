use std::{
    io::{self, BufRead, Write},
    process::Command,
    sync::LazyLock,
};

use regex::Regex;
use tracing::warn;

use crate::Result;

pub const TEST_FOLDER_ID: &str = "1o-YoBQ2IP6KuA896EE41Su52c0-JvAmy";
const PROMPT: &str = "Enter the Google Drive folder URL:";

static FOLDER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/folders/([a-zA-Z0-9_-]+)").expect("valid folder regex"));

/// Pulls the folder ID out of a Drive URL such as
/// `https://drive.google.com/drive/u/0/folders/<id>`.
pub fn parse_folder_id(folder_url: &str) -> Option<String> {
    FOLDER_ID_RE
        .captures(folder_url)
        .map(|caps| caps[1].to_string())
}

/// Asks for the folder URL, with a dialog on macOS and stdin otherwise.
pub fn ask_for_folder_url() -> Result<String> {
    if cfg!(target_os = "macos") {
        match dialog_prompt() {
            Some(url) => return Ok(url),
            None => warn!("dialog prompt unavailable, falling back to stdin"),
        }
    }
    print!("{PROMPT} ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn dialog_prompt() -> Option<String> {
    let script = format!("display dialog \"{PROMPT}\" default answer \"\"");
    let output = Command::new("osascript").args(["-e", script.as_str()]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_dialog_output(&String::from_utf8_lossy(&output.stdout))
}

/// `button returned:OK, text returned:<url>`
fn parse_dialog_output(output: &str) -> Option<String> {
    output
        .split(',')
        .find_map(|part| part.split_once("text returned:"))
        .map(|(_, url)| url.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_id_from_url() {
        assert_eq!(
            parse_folder_id("https://drive.google.com/drive/u/0/folders/1nLtii0Qux-B_fl?usp=sharing")
                .as_deref(),
            Some("1nLtii0Qux-B_fl")
        );
        assert_eq!(parse_folder_id("https://drive.google.com/file/d/abc"), None);
        assert_eq!(parse_folder_id(""), None);
    }

    #[test]
    fn dialog_output() {
        assert_eq!(
            parse_dialog_output("button returned:OK, text returned:https://x/folders/abc\n")
                .as_deref(),
            Some("https://x/folders/abc")
        );
        assert_eq!(parse_dialog_output("button returned:Cancel"), None);
    }
}
