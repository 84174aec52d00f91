use crate::error::Result;
use crate::kind::InstrumentKind;
use chrono::{DateTime, Local};
use comfy_table::{CellAlignment, Table, presets::UTF8_FULL_CONDENSED};
use std::path::{Path, PathBuf};

/// A profile output found on disk
pub struct ProfileFile {
    pub path: PathBuf,
    pub kind: InstrumentKind,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

/// Find the profile outputs present in a directory, most recent first
pub fn find_profiles(dir: &Path) -> Result<Vec<ProfileFile>> {
    let mut profiles = Vec::new();

    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(kind) = InstrumentKind::ALL
            .into_iter()
            .find(|k| k.output_file_name() == name)
        else {
            continue;
        };
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }

        profiles.push(ProfileFile {
            kind,
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
            path,
        });
    }

    profiles.sort_by(|a, b| b.modified.cmp(&a.modified).then(a.path.cmp(&b.path)));
    Ok(profiles)
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Run the list command
pub fn run(dir: Option<&Path>) -> Result<()> {
    let search_dir = dir.unwrap_or_else(|| Path::new("."));
    let profiles = find_profiles(search_dir)?;

    if profiles.is_empty() {
        println!("No profile outputs found in {}", search_dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["FILE", "KIND", "SIZE", "MODIFIED"]);
    if let Some(column) = table.column_mut(2) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    for profile in profiles {
        let filename = profile
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = profile
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        table.add_row(vec![
            filename,
            profile.kind.mode_name().to_string(),
            format_size(profile.size),
            modified,
        ]);
    }

    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_only_profile_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cpu.pprof"), b"x").unwrap();
        std::fs::write(dir.path().join("trace.out"), b"xyz").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        std::fs::create_dir(dir.path().join("mem.pprof")).unwrap();

        let mut found: Vec<(InstrumentKind, u64)> = find_profiles(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| (p.kind, p.size))
            .collect();
        found.sort_by_key(|(k, _)| k.mode_name());
        assert_eq!(
            found,
            vec![
                (InstrumentKind::ExecutionTime, 1),
                (InstrumentKind::ExecutionTrace, 3),
            ]
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }
}
