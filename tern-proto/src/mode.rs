//! The channel mode engine: `setMode(channel, signedModeString, dataString)`.
//!
//! A signed mode string is `(+|-)letters…` paired with a space-separated
//! argument list. Not every letter consumes an argument — that's governed by
//! the server's CHANMODES descriptor (the four classes below) — and argument
//! alignment is resolved right-to-left, tail first, so that a trailing letter
//! always claims the trailing argument.

use crate::error::ModeError;

/// The four ISUPPORT `CHANMODES=A,B,C,D` argument classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeClass {
    /// Always takes an argument, both on set and unset. List-style (bans,
    /// exemptions, invite exceptions, quiets).
    A,
    /// Takes an argument both on set and unset (e.g. channel key).
    B,
    /// Takes an argument only on set (e.g. user limit).
    C,
    /// Never takes an argument (e.g. moderated, secret, no-external-messages).
    D,
}

/// Letters treated as ban-class list modes: these accumulate any
/// previously-buffered `e` (exemption) entries onto the mode they construct.
const BAN_CLASS: &[char] = &['b', 'q', 'I'];
/// The exemption letter. Never stored as its own entry in `modes`; its
/// argument is buffered onto the next ban-class entry constructed.
const EXEMPTION_LETTER: char = 'e';

/// A server's CHANMODES descriptor, split into its four classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChanModes {
    a: String,
    b: String,
    c: String,
    d: String,
}

/// The RFC2812 baseline, extended with `q` (quiet) and `I` (invite exception)
/// in class A so the ban-class accumulation rule above has somewhere to act
/// before a real ISUPPORT 005 line has been seen.
pub const DEFAULT_CHANMODES: &str = "beIq,k,l,imnpstaqr";

impl Default for ChanModes {
    fn default() -> ChanModes {
        ChanModes::parse(DEFAULT_CHANMODES)
    }
}

impl ChanModes {
    /// Parses an ISUPPORT `CHANMODES` value (`A,B,C,D`). Missing trailing
    /// classes are treated as empty, never a parse failure.
    pub fn parse(raw: &str) -> ChanModes {
        let mut parts = raw.splitn(4, ',');
        ChanModes {
            a: parts.next().unwrap_or_default().to_owned(),
            b: parts.next().unwrap_or_default().to_owned(),
            c: parts.next().unwrap_or_default().to_owned(),
            d: parts.next().unwrap_or_default().to_owned(),
        }
    }

    /// The class governing `letter`, if the server has advertised one.
    pub fn class_of(&self, letter: char) -> Option<ModeClass> {
        if self.a.contains(letter) {
            Some(ModeClass::A)
        } else if self.b.contains(letter) {
            Some(ModeClass::B)
        } else if self.c.contains(letter) {
            Some(ModeClass::C)
        } else if self.d.contains(letter) {
            Some(ModeClass::D)
        } else {
            None
        }
    }

    /// Whether `letter` consumes an argument when set (`plus`) or unset.
    /// Unrecognized letters are treated as class D (dataless).
    fn takes_arg(&self, letter: char, plus: bool) -> bool {
        match self.class_of(letter) {
            Some(ModeClass::A) | Some(ModeClass::B) => true,
            Some(ModeClass::C) => plus,
            Some(ModeClass::D) | None => false,
        }
    }

    fn is_list_class(&self, letter: char) -> bool {
        self.a.contains(letter)
    }
}

/// A decoded extban mask: `$a:account`, `$a:account$#arg`, `$~a:…`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtbanInfo {
    /// The extban type letter (`a` for account).
    pub kind: char,
    /// Set when the mask was negated with a leading `~` (`$~a:…`).
    pub negated: bool,
    /// The decoded account name, for `kind == 'a'`.
    pub account: Option<String>,
    /// A trailing `$#arg`-style argument, if present.
    pub arg: Option<String>,
}

/// Decodes a ban mask as an extban if it starts with `$`.
pub fn parse_extban(mask: &str) -> Option<ExtbanInfo> {
    let rest = mask.strip_prefix('$')?;
    let (negated, rest) = match rest.strip_prefix('~') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };

    let mut halves = rest.splitn(2, ':');
    let mut kind_chars = halves.next()?.chars();
    let kind = kind_chars.next()?;
    if kind_chars.next().is_some() {
        return None;
    }

    let value_part = halves.next().unwrap_or("");
    let mut pieces = value_part.splitn(2, '$');
    let value = pieces.next().unwrap_or("");
    let arg = pieces.next().map(|a| a.trim_start_matches('#').to_owned());
    let account = if kind == 'a' && !value.is_empty() {
        Some(value.to_owned())
    } else {
        None
    };

    Some(ExtbanInfo {
            kind,
            negated,
            account,
            arg,
    })
}

/// One entry in `Channel.modes`: a data-bearing or list-class mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeEntry {
    /// The mode letter (`b`, `k`, `l`, …).
    pub letter: char,
    /// The raw argument, if any. For list-class modes this is the mask.
    pub data: Option<String>,
    /// Decoded extban account, when `data` was an account extban.
    pub account: Option<String>,
    /// Set when the mask was a negated extban (`$~a:…`).
    pub negated: bool,
    /// Exemption masks (`e`) buffered onto this entry when it was
    /// constructed (see `BAN_CLASS`/`EXEMPTION_LETTER` above).
    pub exemptions: Vec<String>,
}

impl ModeEntry {
    fn new(letter: char, data: Option<String>, exemptions: Vec<String>) -> ModeEntry {
        let (account, negated) = match data.as_deref().and_then(parse_extban) {
            Some(extban) => (extban.account, extban.negated),
            None => (None, false),
        };
        ModeEntry {
            letter,
            data,
            account,
            negated,
            exemptions,
        }
    }
}

/// Applies a signed mode string to a channel's mode state.
///
/// `modechars` holds dataless flag modes (class D, plus any unrecognized
/// letter); `entries` holds the richer list/data-bearing modes (classes A/B/C
/// that carry an argument on the relevant sign).
pub fn apply(
    modechars: &mut Vec<char>,
    entries: &mut Vec<ModeEntry>,
    chan_modes: &ChanModes,
    signed: &str,
    data: &str,
) -> Result<(), ModeError> {
    let mut args: Vec<&str> = if data.is_empty() {
        Vec::new()
    } else {
        data.split(' ').filter(|s| !s.is_empty()).collect()
    };

    let mut pairs: Vec<(bool, char)> = Vec::new();
    let mut sign: Option<bool> = None;
    for c in signed.chars() {
        match c {
            '+' => sign = Some(true),
            '-' => sign = Some(false),
            letter if letter.is_ascii_alphabetic() => match sign {
                Some(plus) => pairs.push((plus, letter)),
                None => {
                    return Err(ModeError::MissingSign {
                            string: signed.to_owned(),
                            letter,
                    })
                }
            },
            other => {
                return Err(ModeError::InvalidSign {
                        string: signed.to_owned(),
                        sign: other,
                })
            }
        }
    }

    // Right-to-left so letters align with their arguments from the tail.
    let mut pending_exemptions: Vec<String> = Vec::new();
    for (plus, letter) in pairs.into_iter().rev() {
        if letter == EXEMPTION_LETTER {
            if let Some(arg) = args.pop() {
                pending_exemptions.push(arg.to_owned());
            }
            continue;
        }

        let takes_arg = chan_modes.takes_arg(letter, plus);
        let arg = if takes_arg {
            let popped = args.pop().ok_or_else(|| ModeError::MissingArgument {
                    string: signed.to_owned(),
                    letter,
            })?;
            Some(popped.to_owned())
        } else {
            None
        };

        if takes_arg {
            if plus {
                let exemptions = if BAN_CLASS.contains(&letter) {
                    std::mem::take(&mut pending_exemptions)
                } else {
                    Vec::new()
                };
                entries.push(ModeEntry::new(letter, arg, exemptions));
            } else {
                remove_entry(entries, chan_modes, letter, arg.as_deref());
            }
        } else if plus {
            if !modechars.contains(&letter) {
                modechars.push(letter);
            }
        } else {
            modechars.retain(|&c| c != letter);
        }
    }

    Ok(())
}

/// Removes a data-bearing entry by structural equality.
///
/// List-class (A) removal reproduces a deliberate quirk: when the exact
/// `(letter, data)` pair isn't found among the existing entries, *every*
/// entry with that letter is cleared rather than leaving the list untouched.
/// This is surprising but kept, since plugins may rely on the observable
/// behaviour.
fn remove_entry(entries: &mut Vec<ModeEntry>, chan_modes: &ChanModes, letter: char, data: Option<&str>) {
    let exact = entries
    .iter()
    .position(|e| e.letter == letter && e.data.as_deref() == data);

    match exact {
        Some(index) => {
            entries.remove(index);
        }
        None if chan_modes.is_list_class(letter) => {
            entries.retain(|e| e.letter != letter);
        }
        None => {
            if let Some(index) = entries.iter().position(|e| e.letter == letter) {
                entries.remove(index);
            }
        }
    }
}
