/// Character length, not byte length
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s`
fn tail_chars(s: &str, n: usize) -> String {
    let skip = char_len(s).saturating_sub(n);
    s.chars().skip(skip).collect()
}

/// Split text into overlapping chunks of at most `chunk_size` characters
///
/// Paragraphs (separated by blank lines) are merged greedily. When the next
/// paragraph does not fit, the current chunk is emitted and the new chunk
/// starts with the last `overlap` characters of the emitted one. Anything
/// still longer than `chunk_size` is hard-split with the same overlap.
pub fn split_into_chunks(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    let normalized = text.replace("\r\n", "\n");
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in normalized.split("\n\n").map(str::trim) {
        if paragraph.is_empty() {
            continue;
        }

        let merged_len = if current.is_empty() {
            char_len(paragraph)
        } else {
            char_len(&current) + 2 + char_len(paragraph)
        };

        if merged_len <= chunk_size {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            continue;
        }

        let finished = current.trim();
        let tail = if finished.is_empty() {
            String::new()
        } else {
            chunks.push(finished.to_string());
            tail_chars(finished, overlap)
        };

        current = if tail.is_empty() {
            paragraph.to_string()
        } else {
            format!("{}\n\n{}", tail, paragraph)
        };

        while char_len(&current) > chunk_size {
            chunks.push(current.chars().take(chunk_size).collect());
            current = current.chars().skip(chunk_size - overlap).collect();
        }
    }

    let finished = current.trim();
    if !finished.is_empty() {
        chunks.push(finished.to_string());
    }

    chunks
}
