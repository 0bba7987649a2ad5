//! In-place header rewriting on raw request text
//!
//! The request is never parsed into a header map. A header is located by a
//! literal search and its line is replaced by byte offset, so every byte
//! outside the touched line survives unchanged.

/// Marks the end of the header section
pub const HEADER_TERMINATOR: &str = "\r\n\r\n";

/// Where a header line has to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splice {
    /// Replace `request[start..end]`. `start` is the key position and `end`
    /// the first line break after it.
    Replace { start: usize, end: usize },
    /// Insert a full header line at `at`, directly before the blank line.
    Insert { at: usize },
}

/// Find where `key` should be written in `request`.
///
/// Returns `None` when the key has no line break after it, or when the key is
/// absent and there is no header terminator to insert before.
pub fn locate(request: &str, key: &str) -> Option<Splice> {
    if let Some(start) = request.find(key) {
        // First line break after the key, not the terminator. Searching for
        // the terminator would swallow every header after this one.
        let end = request[start..]
            .find(['\r', '\n'])
            .map(|offset| start + offset)?;
        return Some(Splice::Replace { start, end });
    }

    request
        .find(HEADER_TERMINATOR)
        .map(|terminator| Splice::Insert { at: terminator + 2 })
}

/// Return `request` with header `key` set to `value`.
///
/// Never fails: input that cannot be located comes back unchanged.
pub fn set_header(request: &str, key: &str, value: &str) -> String {
    let Some(splice) = locate(request, key) else {
        return request.to_string();
    };

    match splice {
        Splice::Replace { start, end } => {
            let mut out = String::with_capacity(request.len() + value.len() + 2);
            out.push_str(&request[..start]);
            push_header(&mut out, key, value);
            out.push_str(&request[end..]);
            out
        }
        Splice::Insert { at } => {
            let mut out = String::with_capacity(request.len() + key.len() + value.len() + 4);
            out.push_str(&request[..at]);
            push_header(&mut out, key, value);
            out.push_str("\r\n");
            out.push_str(&request[at..]);
            out
        }
    }
}

/// Apply the relay's two substitutions, `Host` first and then `Cookie`.
pub fn rewrite_request(request: &str, host: &str, cookie: &str) -> String {
    let request = set_header(request, "Host", host);
    set_header(&request, "Cookie", cookie)
}

fn push_header(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
}
