//! The closed set of supported shipping carriers and the free-text
//! normalization around it.
//!
//! Storefront input arrives as arbitrary labels ("FLASH EXPRESS",
//! "ไปรษณีย์ไทย", "j&t express"); everything downstream works on the
//! [`Carrier`] enum. Unknown labels fail closed.

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Carrier {
    ThaiPost,
    Flash,
    Jnt,
    Kerry,
    Ninjavan,
}

impl Carrier {
    pub const ALL: [Carrier; 5] = [
        Carrier::ThaiPost,
        Carrier::Flash,
        Carrier::Jnt,
        Carrier::Kerry,
        Carrier::Ninjavan,
    ];

    /// Display label used in API responses and stored on orders.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Carrier::ThaiPost => "ไปรษณีย์ไทย",
            Carrier::Flash => "Flash",
            Carrier::Jnt => "J&T",
            Carrier::Kerry => "Kerry",
            Carrier::Ninjavan => "Ninjavan",
        }
    }

    /// Prefix for the carrier's `<PREFIX>_TRACK_*` configuration slots.
    #[must_use]
    pub fn config_prefix(self) -> &'static str {
        match self {
            Carrier::ThaiPost => "THAI_POST",
            Carrier::Flash => "FLASH",
            Carrier::Jnt => "JNT",
            Carrier::Kerry => "KERRY",
            Carrier::Ninjavan => "NINJA",
        }
    }

    /// Whether `POST /shipping/track` has a live integration for this
    /// carrier. Kerry and Ninjavan only have config slots so far.
    #[must_use]
    pub fn has_integration(self) -> bool {
        matches!(self, Carrier::ThaiPost | Carrier::Flash | Carrier::Jnt)
    }

    /// Normalize a free-text carrier label by case-insensitive substring
    /// match. First matching alias wins; no match fails closed with `None`.
    #[must_use]
    pub fn from_alias(name: &str) -> Option<Self> {
        let n = name.trim().to_lowercase();
        if n.is_empty() {
            return None;
        }
        if n.contains("flash") {
            Some(Carrier::Flash)
        } else if n.contains("j&t") || n.contains("jnt") {
            Some(Carrier::Jnt)
        } else if n.contains("kerry") {
            Some(Carrier::Kerry)
        } else if n.contains("ninjavan") || n.contains("ninja van") {
            Some(Carrier::Ninjavan)
        } else if n.contains("ไปรษณีย์") || n.contains("post") {
            Some(Carrier::ThaiPost)
        } else {
            None
        }
    }

    /// Guess a carrier from the textual shape of a tracking code.
    ///
    /// Best-effort heuristic only: it fills in a carrier when an order does
    /// not record one and picks which provider to query. It is never allowed
    /// to overwrite stored data, and misclassification is acceptable.
    #[must_use]
    pub fn guess_from_tracking(code: &str) -> Option<Self> {
        let t = code.trim().to_uppercase();
        if t.is_empty() {
            return None;
        }
        if t.ends_with("TH") || t.starts_with("EG") || t.starts_with("TH") {
            return Some(Carrier::ThaiPost);
        }
        if t.starts_with("JNT") || t.starts_with("J&T") {
            return Some(Carrier::Jnt);
        }
        if t.starts_with("KERRY") || t.starts_with("KRY") || t.starts_with("KY") {
            return Some(Carrier::Kerry);
        }
        // UPU-style codes (two letters, nine digits, two letters) are
        // Thailand Post in practice for this storefront.
        if t.len() >= 10 {
            let upu = Regex::new(r"[A-Z]{2}\d{9}[A-Z]{2}").expect("valid regex");
            if upu.is_match(&t) {
                return Some(Carrier::ThaiPost);
            }
        }
        None
    }

    /// Resolve one of the storefront's exact label variants, as accepted by
    /// the admin shipping form. Stricter than [`Carrier::from_alias`]: no
    /// substring matching, just the known spellings.
    #[must_use]
    pub fn from_storefront_label(label: &str) -> Option<Self> {
        match label.trim() {
            "ไปรษณีย์ไทย" => Some(Carrier::ThaiPost),
            "Flash" => Some(Carrier::Flash),
            "J&T" => Some(Carrier::Jnt),
            "Kerry" | "Kerry Express" => Some(Carrier::Kerry),
            "Ninjavan" | "Ninja Van" => Some(Carrier::Ninjavan),
            _ => None,
        }
    }
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
