use std::fs;
use std::path::Path;
use std::time::SystemTime;

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True when `output` is missing, any input is missing, or any input is
/// strictly newer than `output`. Stats the filesystem on every call.
pub fn needs_rebuild<P: AsRef<Path>>(output: &Path, inputs: &[P]) -> bool {
    let Some(out_time) = mtime(output) else {
        return true; // Never built
    };

    inputs.iter().any(|input| match mtime(input.as_ref()) {
        Some(in_time) => in_time > out_time,
        // Let the compiler report the missing file
        None => true,
    })
}
