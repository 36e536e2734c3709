//! Splitting long file lists across several formatter invocations.

/// Bytes a single argument adds to a command line (text plus separator).
fn arg_len(arg: &str) -> usize {
    arg.len() + 1
}

/// Length of the fixed part of the command line: executable plus flags.
pub fn base_command_len(executable: &str, flags: &[String]) -> usize {
    arg_len(executable) + flags.iter().map(|f| arg_len(f)).sum::<usize>()
}

/// Split `files` into contiguous, order-preserving batches so that
/// `base_len` plus each batch's arguments stays within `max_bytes`.
///
/// A file that alone overflows the limit still gets a batch of its own.
/// An empty file list yields no batches.
pub fn split_batches(files: &[String], base_len: usize, max_bytes: usize) -> Vec<&[String]> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut len = base_len;

    for (i, file) in files.iter().enumerate() {
        let extra = arg_len(file);
        if i > start && len + extra > max_bytes {
            batches.push(&files[start..i]);
            start = i;
            len = base_len;
        }
        len += extra;
    }
    if start < files.len() {
        batches.push(&files[start..]);
    }

    batches
}
