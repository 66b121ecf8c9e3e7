//! Per-platform notifier invocations.

use std::path::{Path, PathBuf};

/// Notification group / application name reported to the OS.
pub const APP_NAME: &str = "notify-mcp";

/// AppUserModelID of the stock PowerShell host; unregistered ids are dropped by Windows.
const POWERSHELL_APP_ID: &str =
    r"{1AC14E77-02E7-4E5D-B744-2EB1AE5198B7}\WindowsPowerShell\v1.0\powershell.exe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux and the BSDs, anything with a freedesktop notification daemon.
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Some(Self::Linux),
            "macos" => Some(Self::MacOs),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }
}

/// A program and its arguments, built without touching the process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl NotifyCommand {
    /// Pick the notifier for `platform`. On macOS `terminal-notifier` is
    /// preferred when it is on `PATH`.
    pub fn for_platform(platform: Platform, title: &str, body: &str, icon: Option<&Path>) -> Self {
        match platform {
            Platform::Linux => Self::notify_send(title, body, icon),
            Platform::MacOs => match which::which("terminal-notifier") {
                Ok(program) => Self::terminal_notifier(program, title, body, icon),
                Err(_) => Self::osascript(title, body),
            },
            Platform::Windows => Self::powershell_toast(title, body, icon),
        }
    }

    pub fn notify_send(title: &str, body: &str, icon: Option<&Path>) -> Self {
        let mut args = vec!["--app-name".to_string(), APP_NAME.to_string()];
        if let Some(icon) = icon {
            args.push("--icon".into());
            args.push(icon.display().to_string());
        }
        // Stop option parsing so a body starting with '-' is not read as a flag.
        args.push("--".into());
        args.push(title.into());
        args.push(body.into());
        Self {
            program: PathBuf::from("notify-send"),
            args,
        }
    }

    pub fn terminal_notifier(
        program: PathBuf,
        title: &str,
        body: &str,
        icon: Option<&Path>,
    ) -> Self {
        let mut args = vec![
            "-title".to_string(),
            title.to_string(),
            "-message".to_string(),
            body.to_string(),
            "-group".to_string(),
            APP_NAME.to_string(),
        ];
        if let Some(icon) = icon {
            args.push("-appIcon".into());
            args.push(icon.display().to_string());
        }
        Self { program, args }
    }

    pub fn osascript(title: &str, body: &str) -> Self {
        let script = format!(
            "display notification \"{}\" with title \"{}\"",
            applescript_escape(body),
            applescript_escape(title)
        );
        Self {
            program: PathBuf::from("osascript"),
            args: vec!["-e".into(), script],
        }
    }

    pub fn powershell_toast(title: &str, body: &str, icon: Option<&Path>) -> Self {
        let image = icon
            .map(|p| {
                format!(
                    r#"<image placement="appLogoOverride" src="{}"/>"#,
                    xml_escape(&p.display().to_string())
                )
            })
            .unwrap_or_default();
        let toast = format!(
            r#"<toast><visual><binding template="ToastGeneric">{image}<text>{}</text><text>{}</text></binding></visual></toast>"#,
            xml_escape(title),
            xml_escape(body)
        );
        let script = format!(
            "[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null\n\
             [Windows.Data.Xml.Dom.XmlDocument, Windows.Data.Xml.Dom.XmlDocument, ContentType = WindowsRuntime] | Out-Null\n\
             $xml = New-Object Windows.Data.Xml.Dom.XmlDocument\n\
             $xml.LoadXml('{}')\n\
             $toast = [Windows.UI.Notifications.ToastNotification]::new($xml)\n\
             [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('{}').Show($toast)",
            powershell_quote(&toast),
            powershell_quote(POWERSHELL_APP_ID)
        );
        Self {
            program: PathBuf::from("powershell.exe"),
            args: vec![
                "-NoProfile".into(),
                "-NonInteractive".into(),
                "-Command".into(),
                script,
            ],
        }
    }

    pub fn to_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        command
    }
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Contents of a single-quoted PowerShell string.
fn powershell_quote(s: &str) -> String {
    s.replace('\'', "''")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn notify_send_args() {
        let cmd = NotifyCommand::notify_send(
            "AI通知助手",
            "时间：x\n任务：y",
            Some(Path::new("/tmp/i.png")),
        );
        assert_eq!(cmd.program, PathBuf::from("notify-send"));
        assert_eq!(
            cmd.args,
            vec![
                "--app-name",
                "notify-mcp",
                "--icon",
                "/tmp/i.png",
                "--",
                "AI通知助手",
                "时间：x\n任务：y"
            ]
        );
    }

    #[test]
    fn notify_send_without_icon() {
        let cmd = NotifyCommand::notify_send("t", "-b", None);
        assert_eq!(cmd.args, vec!["--app-name", "notify-mcp", "--", "t", "-b"]);
    }

    #[test]
    fn terminal_notifier_args() {
        let cmd = NotifyCommand::terminal_notifier(
            PathBuf::from("/opt/homebrew/bin/terminal-notifier"),
            "t",
            "b",
            Some(Path::new("/tmp/i.png")),
        );
        assert_eq!(
            cmd.args,
            vec![
                "-title",
                "t",
                "-message",
                "b",
                "-group",
                "notify-mcp",
                "-appIcon",
                "/tmp/i.png"
            ]
        );
    }

    #[test]
    fn osascript_escapes_quotes() {
        let cmd = NotifyCommand::osascript("a \"b\"", r"c\d");
        assert_eq!(cmd.args[0], "-e");
        assert_eq!(
            cmd.args[1],
            r#"display notification "c\\d" with title "a \"b\"""#
        );
    }

    #[test]
    fn powershell_script_is_escaped() {
        let cmd = NotifyCommand::powershell_toast(
            "it's <ok>",
            "a & b",
            Some(Path::new("C:\\t\\i.png")),
        );
        let script = &cmd.args[3];
        assert!(script.contains("<text>it&apos;s &lt;ok&gt;</text><text>a &amp; b</text>"));
        assert!(script.contains(r#"src="C:\t\i.png""#));
        assert!(script.contains("CreateToastNotifier('{1AC14E77"));
        // The only single quotes left delimit PowerShell strings.
        assert!(!script.contains("it's"));
    }

    #[rstest]
    #[case("'", "''")]
    #[case("a'b'c", "a''b''c")]
    #[case("none", "none")]
    fn powershell_quoting(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(powershell_quote(input), expected);
    }

    #[test]
    fn linux_never_probes_path() {
        let cmd = NotifyCommand::for_platform(Platform::Linux, "t", "b", None);
        assert_eq!(cmd.program, PathBuf::from("notify-send"));
    }
}
