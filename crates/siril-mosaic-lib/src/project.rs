//! Read-only report of a project directory's layout.

use std::path::Path;

use crate::mosaic::{INPUT_DIR, OUTPUT_DIR};
use crate::scripts::FilterMode;

const LIGHT_SAMPLES: usize = 3;
const PROCESS_SAMPLES: usize = 5;
const ROOT_SAMPLES: usize = 10;

/// Describe what is present in `project_dir` and what a mosaic run still needs.
///
/// Never fails: a missing or unreadable directory is reported in the text.
pub fn describe_project(project_dir: &Path) -> String {
    if !project_dir.is_dir() {
        return format!(
            "❌ Project directory '{}' does not exist",
            project_dir.display()
        );
    }

    let mut lines = vec![format!("📁 Project Directory: {}\n", project_dir.display())];

    let lights = project_dir.join(INPUT_DIR);
    if lights.is_dir() {
        match list_names(&lights) {
            Ok(names) => {
                let fits: Vec<String> = names.into_iter().filter(|n| is_fits(n)).collect();
                lines.push(format!(
                    "✅ {INPUT_DIR}/ directory found with {} FITS files",
                    fits.len()
                ));
                if !fits.is_empty() {
                    lines.push(format!("   Sample files: {}", sample(&fits, LIGHT_SAMPLES)));
                }
            }
            Err(_) => lines.push(format!(
                "⚠️ {INPUT_DIR}/ directory found but could not be read (permission denied)"
            )),
        }
    } else {
        lines.push(format!(
            "❌ {INPUT_DIR}/ directory not found - this is required!"
        ));
    }

    let process = project_dir.join(OUTPUT_DIR);
    if process.is_dir() {
        match list_names(&process) {
            Ok(entries) => {
                lines.push(format!(
                    "📁 {OUTPUT_DIR}/ directory found with {} files",
                    entries.len()
                ));
                if !entries.is_empty() {
                    lines.push(format!("   Contents: {}", sample(&entries, PROCESS_SAMPLES)));
                }
            }
            Err(_) => lines.push(format!(
                "⚠️ {OUTPUT_DIR}/ directory found but could not be read (permission denied)"
            )),
        }
    } else {
        lines.push(format!(
            "📁 {OUTPUT_DIR}/ directory will be created automatically during processing"
        ));
    }

    lines.push("\n🔧 SSF Scripts:".to_string());
    for mode in FilterMode::ALL {
        let name = mode.script_name();
        if project_dir.join(name).is_file() {
            lines.push(format!("✅ {name} (for {mode} processing)"));
        } else {
            lines.push(format!(
                "📝 {name} will be created automatically (for {mode} processing)"
            ));
        }
    }

    match list_names(project_dir) {
        Ok(names) => {
            let files: Vec<String> = names
                .into_iter()
                .filter(|n| project_dir.join(n).is_file())
                .collect();
            if !files.is_empty() {
                lines.push(format!(
                    "\n📄 Other files in project root: {}",
                    sample(&files, ROOT_SAMPLES)
                ));
            }
        }
        Err(_) => lines.push("\n⚠️ Permission denied reading project directory".to_string()),
    }

    lines.join("\n")
}

/// Sorted entry names of `dir`.
fn list_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    Ok(names)
}

fn is_fits(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".fit") || lower.ends_with(".fits")
}

/// First `limit` names joined, with `...` when more were left out.
fn sample(names: &[String], limit: usize) -> String {
    let shown = names
        .iter()
        .take(limit)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > limit {
        format!("{shown}...")
    } else {
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_directory_is_described_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("m31");
        assert_eq!(
            describe_project(&missing),
            format!("❌ Project directory '{}' does not exist", missing.display())
        );
    }

    #[test]
    fn empty_project_lists_what_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let report = describe_project(dir.path());

        assert!(report.contains("❌ lights/ directory not found - this is required!"));
        assert!(report.contains("process/ directory will be created automatically"));
        assert!(report.contains(
            "📝 Naztronomy-Seestar_Broadband_Mosaic.ssf will be created automatically (for broadband processing)"
        ));
        assert!(report.contains(
            "📝 Naztronomy-Seestar_Narrowband_Mosaic.ssf will be created automatically (for narrowband processing)"
        ));
        assert!(!report.contains("Other files"));
    }

    #[test]
    fn populated_project_counts_and_samples() {
        let dir = tempfile::tempdir().unwrap();
        let lights = dir.path().join("lights");
        fs::create_dir(&lights).unwrap();
        for name in ["a.fit", "b.FITS", "c.fits", "d.fit", "notes.txt"] {
            fs::write(lights.join(name), b"").unwrap();
        }
        let process = dir.path().join("process");
        fs::create_dir(&process).unwrap();
        fs::write(process.join("light_00001.fit"), b"").unwrap();
        fs::write(
            dir.path().join(FilterMode::Narrowband.script_name()),
            FilterMode::Narrowband.script_contents(),
        )
        .unwrap();

        let report = describe_project(dir.path());

        assert!(report.contains("✅ lights/ directory found with 4 FITS files"));
        assert!(report.contains("   Sample files: a.fit, b.FITS, c.fits..."));
        assert!(report.contains("📁 process/ directory found with 1 files"));
        assert!(report.contains("   Contents: light_00001.fit"));
        assert!(report.contains(
            "✅ Naztronomy-Seestar_Narrowband_Mosaic.ssf (for narrowband processing)"
        ));
        assert!(report.contains(
            "📄 Other files in project root: Naztronomy-Seestar_Narrowband_Mosaic.ssf"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_lights_is_flagged_not_counted() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let lights = dir.path().join("lights");
        fs::create_dir(&lights).unwrap();
        fs::write(lights.join("a.fit"), b"").unwrap();
        fs::set_permissions(&lights, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores directory permissions.
        let readable = fs::read_dir(&lights).is_ok();
        let report = describe_project(dir.path());
        fs::set_permissions(&lights, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            assert!(report.contains("✅ lights/ directory found with 1 FITS files"));
        } else {
            let warning = "⚠️ lights/ directory found but could not be read (permission denied)";
            assert!(report.contains(warning));
            assert!(!report.contains("found with 0 FITS files"));
        }
    }

    #[test]
    fn sample_truncates_with_ellipsis() {
        let names: Vec<String> = (0..12).map(|i| format!("f{i:02}")).collect();
        assert_eq!(sample(&names[..2], 3), "f00, f01");
        assert!(sample(&names, 10).ends_with("f09..."));
    }
}
