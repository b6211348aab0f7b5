//! File helpers at the I/O boundary

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use log::debug;

use crate::error::{Error, Result};

pub fn read_file(path: impl AsRef<Path>) -> Result<String>
{   let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| match e.kind()
    {   io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf())
      , _ => Error::Io(format!(
          "Error reading file {}: {}", path.display(), e
        ))
    })
}

/// Write `content` to `path`, creating parent directories.
/// Fails with `FileExists` when `path` exists and `overwrite`
/// is false; the existence check and the create are one step.
pub fn write_file(
  path: impl AsRef<Path>
, content: &str
, overwrite: bool
) -> Result<()>
{   let path = path.as_ref();
    if let Some(parent) = path.parent()
      .filter(|p| !p.as_os_str().is_empty())
    {   fs::create_dir_all(parent).map_err(|e| {
          Error::Io(format!(
            "Error creating directory {}: {}", parent.display(), e
          ))
        })?;
    }

    let write_error = |e: io::Error| {
      Error::Io(format!(
        "Error writing to file {}: {}", path.display(), e
      ))
    };
    if overwrite
    {   fs::write(path, content).map_err(write_error)?;
    } else
    {   let mut file = OpenOptions::new()
          .write(true)
          .create_new(true)
          .open(path)
          .map_err(|e| match e.kind()
          {   io::ErrorKind::AlreadyExists => {
                Error::FileExists(path.to_path_buf())
              }
            , _ => write_error(e)
          })?;
        file.write_all(content.as_bytes()).map_err(write_error)?;
    }
    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Cut `text` to at most `max_chars` characters, ending with
/// `suffix` when anything was removed
pub fn truncate(text: &str, max_chars: usize, suffix: &str) -> String
{   if text.chars().count() <= max_chars
    {   return text.to_string();
    }
    let keep = max_chars.saturating_sub(suffix.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_write_then_read()
    {   let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.txt");
        write_file(&path, "hello", false).unwrap();
        assert_eq!(read_file(&path).unwrap(), "hello");
    }

    #[test]
    fn test_existing_file_guard()
    {   let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.txt");
        write_file(&path, "one", false).unwrap();

        let err = write_file(&path, "two", false).unwrap_err();
        assert_eq!(err, Error::FileExists(path.clone()));
        assert_eq!(read_file(&path).unwrap(), "one");

        write_file(&path, "two", true).unwrap();
        assert_eq!(read_file(&path).unwrap(), "two");
    }

    #[test]
    fn test_concurrent_writers_one_wins()
    {   let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_race.py");

        let results: Vec<Result<()>> = std::thread::scope(|s| {
          let handles: Vec<_> = (0..8)
            .map(|i| {
              let path = &path;
              s.spawn(move || {
                write_file(path, &format!("writer = {}\n", i), false)
              })
            })
            .collect();
          handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err())
        {   assert_eq!(*err, Error::FileExists(path.clone()));
        }
        assert!(read_file(&path).unwrap().starts_with("writer = "));
    }

    #[test]
    fn test_creates_parent_directories()
    {   let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("test_x.py");
        write_file(&path, "x = 1\n", false).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_missing_file()
    {   let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.py");
        assert_eq!(
          read_file(&path).unwrap_err(),
          Error::FileNotFound(path)
        );
    }

    #[test]
    fn test_truncate()
    {   assert_eq!(truncate("abcdef", 4, "..."), "a...");
        assert_eq!(truncate("abc", 4, "..."), "abc");
        assert_eq!(truncate("héllo wörld", 5, "…"), "héll…");
    }
}
