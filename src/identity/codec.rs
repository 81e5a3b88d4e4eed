//! # Key Codec
//!
//! Maps a caller's numeric identity onto an alphabetic record key.
//!
//! `encode` folds each pair of adjacent digits whose sum is below 52 into a single
//! letter at index `d1 + d2`, otherwise it emits the letter at `d1` and advances one
//! digit. A trailing digit is emitted as the letter at its own value. `decode` renders
//! each letter's alphabet index in decimal.
//!
//! The pair is a stable alias, not a reversible encoding: a folded letter carries a
//! digit sum, so `decode(encode(x)) != x` whenever folding happened. Callers only
//! ever compare encoded forms.
//!
//! Distinct ids can share a key: `encode("3") == encode("12") == "d"`. Two such
//! callers share one owner key and can mutate each other's records.
//!
//! The trailing digit uses its value, not its position in the string. Keys stored
//! by a deployment that used the positional letter will not match keys produced
//! here for ids of odd length.

use super::errors::{IdentityError, IdentityResult};

/// Lower then upper case ASCII letters, index 0..=51
pub const ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const FOLD_LIMIT: u32 = ALPHABET.len() as u32;

fn digit_at(digits: &[char], position: usize) -> IdentityResult<u32> {
    let c = digits[position];
    c.to_digit(10)
        .ok_or(IdentityError::NonDigit { position, found: c })
}

fn letter(index: u32) -> char {
    ALPHABET[index as usize] as char
}

/// Encode a decimal digit string into its alphabetic key
pub fn encode(digits: &str) -> IdentityResult<String> {
    let chars: Vec<char> = digits.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(len);

    let mut i = 0;
    while i < len {
        let d1 = digit_at(&chars, i)?;
        if i == len - 1 {
            out.push(letter(d1));
            break;
        }
        let d2 = digit_at(&chars, i + 1)?;
        let sum = d1 + d2;
        if sum < FOLD_LIMIT {
            out.push(letter(sum));
            i += 2;
        } else {
            out.push(letter(d1));
            i += 1;
        }
    }

    Ok(out)
}

/// Render each letter's alphabet index in decimal, concatenated
pub fn decode(key: &str) -> IdentityResult<String> {
    let mut out = String::with_capacity(key.len() * 2);
    for c in key.chars() {
        let index = ALPHABET
            .iter()
            .position(|&b| b as char == c)
            .ok_or(IdentityError::NotInAlphabet(c))?;
        out.push_str(&index.to_string());
    }
    Ok(out)
}
