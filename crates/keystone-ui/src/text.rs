/// Inserts spaces at word boundaries of a camel-cased identifier:
/// `"MainMenuState"` -> `"Main Menu State"`, `"HTMLParser"` -> `"HTML Parser"`.
///
/// Two passes: an upper run followed by a capitalized word splits before the
/// word; then a lowercase letter followed by anything other than lowercase or
/// whitespace splits after the letter.
pub fn split_camel_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let pass = split_pass(&chars, 3, |w| {
        is_boundary(w[0]) && is_boundary(w[1]) && w[2].is_lowercase()
    });
    let pass = split_pass(&pass, 2, |w| w[0].is_lowercase() && is_boundary(w[1]));
    pass.into_iter().collect()
}

#[inline]
fn is_boundary(c: char) -> bool {
    !c.is_lowercase() && !c.is_whitespace()
}

/// Scans non-overlapping windows of `width`, inserting a space after the
/// first char of every match.
fn split_pass(chars: &[char], width: usize, matches: impl Fn(&[char]) -> bool) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        if i + width <= chars.len() && matches(&chars[i..i + width]) {
            out.push(chars[i]);
            out.push(' ');
            out.extend_from_slice(&chars[i + 1..i + width]);
            i += width;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words() {
        assert_eq!(split_camel_case("ViewService"), "View Service");
        assert_eq!(split_camel_case("MainMenuState"), "Main Menu State");
        assert_eq!(split_camel_case("HTMLParser"), "HTML Parser");
        assert_eq!(split_camel_case("frameCount2"), "frame Count 2");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(split_camel_case(""), "");
        assert_eq!(split_camel_case("Already Split"), "Already Split");
        assert_eq!(split_camel_case("lower"), "lower");
        assert_eq!(split_camel_case("FPS"), "FPS");
    }
}
