use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Fewer inputs than this is rejected before anything touches the disk.
pub const MIN_INPUTS: usize = 2;

pub const DEFAULT_OUTPUT_EXTENSION: &str = "mp4";

/// Containers offered in the save dialog, as (label, extension).
pub const OUTPUT_FILTERS: [(&str, &str); 3] = [
    ("MP4 files", "mp4"),
    ("AVI files", "avi"),
    ("MKV files", "mkv"),
];

/// Something that can join the files listed in a concat manifest.
pub trait ConcatTool {
    fn concat(&self, manifest: &Path, output: &Path) -> Result<()>;
}

/// Runs the ffmpeg binary with the concat demuxer in stream-copy mode.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: String,
}

impl Ffmpeg {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn command(&self, manifest: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        // -y: the save dialog already confirmed any overwrite
        cmd.arg("-y")
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(manifest)
            .args(["-c", "copy"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl ConcatTool for Ffmpeg {
    fn concat(&self, manifest: &Path, output: &Path) -> Result<()> {
        let mut cmd = self.command(manifest, output);
        debug!(
            "Executing: {} {}",
            self.binary,
            cmd.get_args()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let status = cmd
            .status()
            .with_context(|| format!("Failed to launch {}", self.binary))?;
        if !status.success() {
            bail!("{} failed with {}", self.binary, status);
        }
        Ok(())
    }
}

/// Concat list on disk, removed again when dropped.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    /// Writes one `file '<absolute path>'` line per input, in order.
    pub fn write(path: &Path, inputs: &[PathBuf]) -> Result<Self> {
        Self::write_with(path, inputs, |path, list| fs::write(path, list))
    }

    fn write_with<F>(path: &Path, inputs: &[PathBuf], write: F) -> Result<Self>
    where
        F: FnOnce(&Path, &str) -> io::Result<()>,
    {
        let mut list = String::new();
        for input in inputs {
            list.push_str(&manifest_line(&absolute_path(input)));
            list.push('\n');
        }

        // Guard first, so a partially written file is removed on error.
        let manifest = Self {
            path: path.to_path_buf(),
        };
        write(path, &list)
            .with_context(|| format!("Error while writing to {}", path.display()))?;
        debug!("Wrote manifest {} with {} entries", path.display(), inputs.len());

        Ok(manifest)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Manifest {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed manifest {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove manifest {}: {}", self.path.display(), e),
        }
    }
}

/// One concat demuxer entry. Single quotes inside the path are closed,
/// escaped and reopened the way the demuxer's tokenizer expects.
pub fn manifest_line(path: &Path) -> String {
    let quoted = path.to_string_lossy().replace('\'', r"'\''");
    format!("file '{}'", quoted)
}

pub fn absolute_path(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

/// Appends the default container extension when the chosen name has none.
pub fn with_default_extension(mut output: PathBuf) -> PathBuf {
    let missing = output.extension().map_or(true, |ext| ext.is_empty());
    if missing {
        output.set_extension(DEFAULT_OUTPUT_EXTENSION);
    }
    output
}

/// Writes the manifest, runs `tool` and removes the manifest again whatever
/// the outcome.
pub fn concatenate(
    tool: &dyn ConcatTool,
    manifest_path: &Path,
    inputs: &[PathBuf],
    output: &Path,
) -> Result<()> {
    if inputs.len() < MIN_INPUTS {
        bail!(
            "At least {} videos are needed, got {}",
            MIN_INPUTS,
            inputs.len()
        );
    }

    let manifest = Manifest::write(manifest_path, inputs)?;
    info!(
        "Concatenating {} videos into {}",
        inputs.len(),
        output.display()
    );
    let result = tool.concat(manifest.path(), output);
    drop(manifest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs::File;
    use tempfile::TempDir;

    struct RecordingTool {
        manifest_contents: RefCell<Option<String>>,
        calls: RefCell<usize>,
        fail_with: Option<String>,
    }

    impl RecordingTool {
        fn new(fail_with: Option<&str>) -> Self {
            Self {
                manifest_contents: RefCell::new(None),
                calls: RefCell::new(0),
                fail_with: fail_with.map(String::from),
            }
        }
    }

    impl ConcatTool for RecordingTool {
        fn concat(&self, manifest: &Path, _output: &Path) -> Result<()> {
            *self.calls.borrow_mut() += 1;
            *self.manifest_contents.borrow_mut() = Some(fs::read_to_string(manifest)?);
            match &self.fail_with {
                Some(msg) => bail!("{}", msg),
                None => Ok(()),
            }
        }
    }

    fn make_inputs(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                File::create(&path).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_manifest_line_format() {
        assert_eq!(
            manifest_line(Path::new("/videos/a.mp4")),
            "file '/videos/a.mp4'"
        );
    }

    #[test]
    fn test_manifest_line_escapes_single_quote() {
        assert_eq!(
            manifest_line(Path::new("/videos/it's.mp4")),
            r"file '/videos/it'\''s.mp4'"
        );
    }

    #[test]
    fn test_manifest_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = make_inputs(temp_dir.path(), &["a.mp4", "b.mp4"]);
        let manifest_path = temp_dir.path().join("input_list.txt");

        let manifest = Manifest::write(&manifest_path, &inputs).unwrap();
        assert!(manifest_path.exists());
        drop(manifest);
        assert!(!manifest_path.exists());
    }

    #[test]
    fn test_manifest_drop_tolerates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = make_inputs(temp_dir.path(), &["a.mp4", "b.mp4"]);
        let manifest_path = temp_dir.path().join("input_list.txt");

        let manifest = Manifest::write(&manifest_path, &inputs).unwrap();
        fs::remove_file(&manifest_path).unwrap();
        drop(manifest);
        assert!(!manifest_path.exists());
    }

    #[test]
    fn test_manifest_partial_write_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = make_inputs(temp_dir.path(), &["a.mp4", "b.mp4"]);
        let manifest_path = temp_dir.path().join("input_list.txt");

        let result = Manifest::write_with(&manifest_path, &inputs, |path, list| {
            fs::write(path, &list[..list.len() / 2])?;
            Err(io::Error::new(io::ErrorKind::Other, "No space left on device"))
        });

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Error while writing to"));
        assert!(!manifest_path.exists());
    }

    #[test]
    fn test_concatenate_writes_lines_in_order_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = make_inputs(temp_dir.path(), &["c.mkv", "a.mp4", "b.avi"]);
        let manifest_path = temp_dir.path().join("input_list.txt");
        let tool = RecordingTool::new(None);

        concatenate(&tool, &manifest_path, &inputs, &temp_dir.path().join("out.mp4")).unwrap();

        let contents = tool.manifest_contents.borrow().clone().unwrap();
        let expected: String = inputs
            .iter()
            .map(|p| format!("file '{}'\n", dunce::canonicalize(p).unwrap().display()))
            .collect();
        assert_eq!(contents, expected);
        assert_eq!(contents.lines().count(), 3);
        assert!(!manifest_path.exists());
    }

    #[test]
    fn test_concatenate_cleans_up_on_failure() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = make_inputs(temp_dir.path(), &["a.mp4", "b.mp4"]);
        let manifest_path = temp_dir.path().join("input_list.txt");
        let tool = RecordingTool::new(Some("ffmpeg exploded"));

        let err = concatenate(&tool, &manifest_path, &inputs, &temp_dir.path().join("out.mp4"))
            .unwrap_err();

        assert_eq!(err.to_string(), "ffmpeg exploded");
        assert_eq!(*tool.calls.borrow(), 1);
        assert!(!manifest_path.exists());
    }

    #[test]
    fn test_concatenate_rejects_single_input() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = make_inputs(temp_dir.path(), &["a.mp4"]);
        let manifest_path = temp_dir.path().join("input_list.txt");
        let tool = RecordingTool::new(None);

        assert!(concatenate(&tool, &manifest_path, &inputs, &temp_dir.path().join("out.mp4")).is_err());
        assert_eq!(*tool.calls.borrow(), 0);
        assert!(!manifest_path.exists());
    }

    #[test]
    fn test_concatenate_manifest_write_failure() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = make_inputs(temp_dir.path(), &["a.mp4", "b.mp4"]);
        let manifest_path = temp_dir.path().join("missing_dir").join("input_list.txt");
        let tool = RecordingTool::new(None);

        let err = concatenate(&tool, &manifest_path, &inputs, Path::new("out.mp4")).unwrap_err();
        assert!(err.to_string().contains("Error while writing to"));
        assert_eq!(*tool.calls.borrow(), 0);
    }

    #[test]
    fn test_ffmpeg_command_arguments() {
        let ffmpeg = Ffmpeg::new("ffmpeg");
        let cmd = ffmpeg.command(Path::new("input_list.txt"), Path::new("/tmp/out.mp4"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();
        assert_eq!(cmd.get_program(), "ffmpeg");
        assert_eq!(
            args,
            vec![
                "-y", "-f", "concat", "-safe", "0", "-i", "input_list.txt", "-c", "copy",
                "/tmp/out.mp4"
            ]
        );
    }

    #[test]
    fn test_ffmpeg_missing_binary_is_error() {
        let ffmpeg = Ffmpeg::new("definitely-not-a-real-ffmpeg-binary");
        let err = ffmpeg
            .concat(Path::new("input_list.txt"), Path::new("out.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to launch"));
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_exit_status() {
        assert!(Ffmpeg::new("true")
            .concat(Path::new("input_list.txt"), Path::new("out.mp4"))
            .is_ok());
        let err = Ffmpeg::new("false")
            .concat(Path::new("input_list.txt"), Path::new("out.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("false failed with"));
    }

    #[test]
    fn test_with_default_extension() {
        assert_eq!(
            with_default_extension(PathBuf::from("/tmp/joined")),
            PathBuf::from("/tmp/joined.mp4")
        );
        assert_eq!(
            with_default_extension(PathBuf::from("/tmp/joined.")),
            PathBuf::from("/tmp/joined.mp4")
        );
        assert_eq!(
            with_default_extension(PathBuf::from("/tmp/joined.mkv")),
            PathBuf::from("/tmp/joined.mkv")
        );
    }
}
