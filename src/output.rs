use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::record::TitleRecord;
use crate::sites::Site;

pub fn final_path(out_dir: &Path, site: Site) -> PathBuf {
    out_dir.join(format!("{}_titles.json", site.slug()))
}

pub fn checkpoint_path(out_dir: &Path, site: Site, count: usize) -> PathBuf {
    out_dir.join(format!("{}_partial_{}.json", site.slug(), count))
}

/// Pretty JSON array, parent directories created as needed.
pub fn write_json(path: &Path, records: &[TitleRecord]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, records)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

pub fn read_json(path: &Path) -> Result<Vec<TitleRecord>> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = final_path(&dir.path().join("nested"), Site::Kakao);
        let mut r = TitleRecord::new("https://page.kakao.com/content/53764524");
        r.view_count = Some(5_123_000);
        write_json(&path, &[r.clone(), TitleRecord::failed("x", "HTTP 404 for x")]).unwrap();

        let back = read_json(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], r);
        assert!(back[1].is_error());
        assert!(path.ends_with("kakao_titles.json"));
    }

    #[test]
    fn checkpoint_names() {
        let p = checkpoint_path(Path::new("data"), Site::Naver, 50);
        assert_eq!(p, PathBuf::from("data/naver_partial_50.json"));
    }
}
