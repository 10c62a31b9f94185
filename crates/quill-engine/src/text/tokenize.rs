//! Splits stanza text into the word tiles the motion engine lays out.

/// Split a stanza into word tiles.
///
/// Words are separated on whitespace and newlines. A single-character word
/// that is not the first word merges backward into the word before it,
/// joined by a space, so a lone "I" or dash never gets its own tile.
pub fn split_into_tiles(text: &str) -> Vec<String> {
    let mut words: Vec<String> = text
        .lines()
        .flat_map(|line| line.split_whitespace())
        .map(str::to_string)
        .collect();

    // Collect merge indices first, then apply in reverse so earlier
    // indices stay valid while later ones are folded away.
    let to_join: Vec<usize> = words
        .iter()
        .enumerate()
        .filter(|(i, w)| *i > 0 && w.chars().count() == 1)
        .map(|(i, _)| i)
        .collect();
    for &i in to_join.iter().rev() {
        let short = words.remove(i);
        let prev = &mut words[i - 1];
        prev.push(' ');
        prev.push_str(&short);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_and_newlines() {
        let tiles = split_into_tiles("Because could not\nstop for Death");
        assert_eq!(
            tiles,
            vec!["Because", "could", "not", "stop", "for", "Death"]
        );
    }

    #[test]
    fn compound_words_stay_whole() {
        let tiles = split_into_tiles("I_farted! You_farted!");
        assert_eq!(tiles, vec!["I_farted!", "You_farted!"]);
    }

    #[test]
    fn single_letter_merges_backward() {
        let tiles = split_into_tiles("A B cat");
        assert_eq!(tiles, vec!["A B", "cat"]);
    }

    #[test]
    fn leading_single_letter_survives_alone() {
        let tiles = split_into_tiles("I could not stop");
        assert_eq!(tiles, vec!["I could", "not", "stop"]);
    }

    #[test]
    fn dash_merges_into_previous_word() {
        let tiles = split_into_tiles("stopped for me -");
        assert_eq!(tiles, vec!["stopped", "for", "me -"]);
    }

    #[test]
    fn empty_stanza_yields_no_tiles() {
        assert!(split_into_tiles("").is_empty());
        assert!(split_into_tiles("\n  \n").is_empty());
    }
}
