/// Splits an input line into whitespace-delimited words.
/// There is no quoting or escaping; every run of non-blank bytes is a word.
pub fn tokenize(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

/// The display form of a program word: its final path component.
///
/// `/bin/ls` becomes `ls`; a bare word is returned as is.
pub fn display_name(word: &str) -> &str {
    match word.rfind('/') {
        Some(slash) => &word[slash + 1..],
        None => word,
    }
}
