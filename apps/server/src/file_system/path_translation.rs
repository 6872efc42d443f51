//! Host-to-container path rewriting.
//!
//! Clients send paths as they see them on the host (`C:\Users\me`, `/home/me`). When the service
//! runs inside a container, the host filesystem is mounted under a fixed root, so those paths have
//! to be rewritten before any I/O happens. The rewritten form is the "resolved path"; the client's
//! form is the "logical path" and is what result entries carry.

/// Where the service runs relative to the filesystem it lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    /// Paths are used as-is.
    #[default]
    Native,
    /// The host filesystem is mounted under `mount_root`.
    Containerized { mount_root: String },
}

/// Maps a client-supplied path to the path used for filesystem I/O.
///
/// Never fails. Input that doesn't look like a path is rewritten best-effort.
pub fn translate_path(input: &str, mode: &RuntimeMode) -> String {
    let mount_root = match mode {
        RuntimeMode::Native => return input.to_string(),
        RuntimeMode::Containerized { mount_root } => mount_root.trim_end_matches('/'),
    };

    if is_bare_drive(input) {
        return format!("{}/{}", mount_root, drive_letter(input));
    }

    if is_drive_path(input) {
        // Both the letter and the colon are ASCII, so byte 2 is a char boundary
        let rest = input[2..].replace('\\', "/");
        let rest = rest.trim_end_matches('/');
        return format!("{}/{}{}", mount_root, drive_letter(input), rest);
    }

    let separator = if input.starts_with('/') { "" } else { "/" };
    let joined = format!("{}{}{}", mount_root, separator, input);
    let trimmed = joined.trim_end_matches('/');
    if trimmed.is_empty() {
        // Mount root was "/" and the input was empty or all slashes
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Drive-letter path with a separator right after the colon, like `C:\` or `d:/foo`.
fn is_drive_path(input: &str) -> bool {
    matches!(input.as_bytes(), [letter, b':', b'\\' | b'/', ..] if letter.is_ascii_alphabetic())
}

/// Bare drive reference: `C:`, `C:\` or `C:/`.
fn is_bare_drive(input: &str) -> bool {
    matches!(input.as_bytes(), [letter, b':'] | [letter, b':', b'\\' | b'/'] if letter.is_ascii_alphabetic())
}

fn drive_letter(input: &str) -> char {
    input.chars().next().map(|c| c.to_ascii_lowercase()).unwrap_or('c')
}

/// Joins an entry name onto a logical directory path, keeping the caller's separator style.
///
/// Windows-style paths (`C:\foo`) get a backslash, everything else a forward slash. Trailing
/// separators on the directory are collapsed so `"/tmp/"` + `"a"` gives `"/tmp/a"`.
pub fn join_logical(dir: &str, name: &str) -> String {
    let backslash_style =
        (is_drive_path(dir) && dir.contains('\\') || is_bare_drive(dir)) && !dir.contains('/');
    let separator = if backslash_style { '\\' } else { '/' };

    let base = dir.trim_end_matches(['/', '\\']);
    if base.is_empty() && !dir.is_empty() {
        // The directory was the filesystem root itself
        return format!("{}{}", separator, name);
    }
    if base.is_empty() {
        return name.to_string();
    }
    format!("{}{}{}", base, separator, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> RuntimeMode {
        RuntimeMode::Containerized {
            mount_root: "/host".to_string(),
        }
    }

    #[test]
    fn test_native_mode_passes_through() {
        assert_eq!(translate_path("C:\\Users\\me\\", &RuntimeMode::Native), "C:\\Users\\me\\");
        assert_eq!(translate_path("/home/me/", &RuntimeMode::Native), "/home/me/");
    }

    #[test]
    fn test_drive_path_is_rewritten_under_mount() {
        assert_eq!(translate_path("C:\\Users\\me", &container()), "/host/c/Users/me");
        assert_eq!(translate_path("D:/data/logs/", &container()), "/host/d/data/logs");
        assert_eq!(translate_path("e:\\a\\b\\\\", &container()), "/host/e/a/b");
    }

    #[test]
    fn test_bare_drive_maps_to_drive_root() {
        assert_eq!(translate_path("C:", &container()), "/host/c");
        assert_eq!(translate_path("C:\\", &container()), "/host/c");
        assert_eq!(translate_path("z:/", &container()), "/host/z");
    }

    #[test]
    fn test_unix_path_is_prefixed_without_double_slash() {
        assert_eq!(translate_path("/home/me", &container()), "/host/home/me");
        assert_eq!(translate_path("home/me/", &container()), "/host/home/me");
        assert_eq!(translate_path("/", &container()), "/host");
        assert_eq!(translate_path("", &container()), "/host");
    }

    #[test]
    fn test_mount_root_trailing_slash_is_ignored() {
        let mode = RuntimeMode::Containerized {
            mount_root: "/mnt/host/".to_string(),
        };
        assert_eq!(translate_path("/srv", &mode), "/mnt/host/srv");
        assert_eq!(translate_path("C:\\", &mode), "/mnt/host/c");
    }

    #[test]
    fn test_join_logical_unix() {
        assert_eq!(join_logical("/tmp", "a.txt"), "/tmp/a.txt");
        assert_eq!(join_logical("/tmp/", "a.txt"), "/tmp/a.txt");
        assert_eq!(join_logical("/", "etc"), "/etc");
        assert_eq!(join_logical("relative/dir", "x"), "relative/dir/x");
    }

    #[test]
    fn test_join_logical_windows() {
        assert_eq!(join_logical("C:\\Users", "me"), "C:\\Users\\me");
        assert_eq!(join_logical("C:\\", "Windows"), "C:\\Windows");
        assert_eq!(join_logical("C:", "Windows"), "C:\\Windows");
        assert_eq!(join_logical("C:/Users", "me"), "C:/Users/me");
    }
}
