//! Locality name → hh.ru region (`area`) id.

/// Region id of Moscow, used whenever a name cannot be resolved.
pub const DEFAULT_REGION_ID: u32 = 1;

/// Known localities. Keys are lowercase with `ё` folded to `е`.
static REGIONS: &[(&str, u32)] = &[
    ("москва", 1),
    ("санкт-петербург", 2),
    ("спб", 2),
    ("екатеринбург", 3),
    ("новосибирск", 4),
    ("архангельск", 9),
    ("барнаул", 10),
    ("астрахань", 11),
    ("белгород", 13),
    ("ярославль", 16),
    ("брянск", 19),
    ("владивосток", 22),
    ("владимир", 23),
    ("волгоград", 24),
    ("воронеж", 26),
    ("хабаровск", 30),
    ("петрозаводск", 31),
    ("грозный", 34),
    ("элиста", 38),
    ("калининград", 41),
    ("иваново", 43),
    ("ижевск", 44),
    ("иркутск", 46),
    ("калуга", 48),
    ("киров", 50),
    ("краснодар", 53),
    ("красноярск", 54),
    ("кострома", 56),
    ("курск", 59),
    ("липецк", 61),
    ("магадан", 62),
    ("махачкала", 63),
    ("мурманск", 64),
    ("нальчик", 65),
    ("нижний новгород", 66),
    ("новгород", 67),
    ("омск", 68),
    ("орел", 69),
    ("пенза", 71),
    ("пермь", 72),
    ("псков", 73),
    ("ростов-на-дону", 76),
    ("ростов", 76),
    ("рязань", 77),
    ("самара", 78),
    ("саратов", 79),
    ("смоленск", 83),
    ("ставрополь", 85),
    ("сыктывкар", 86),
    ("казань", 88),
    ("тверь", 90),
    ("тула", 93),
    ("тюмень", 95),
    ("уфа", 99),
    ("чебоксары", 103),
    ("челябинск", 104),
    ("донецк", 107),
    ("луганск", 108),
    ("запорожье", 109),
    ("херсон", 110),
    ("симферополь", 118),
    ("севастополь", 119),
    // Latin spellings of the largest cities.
    ("moscow", 1),
    ("saint petersburg", 2),
    ("st. petersburg", 2),
    ("spb", 2),
    ("yekaterinburg", 3),
    ("novosibirsk", 4),
    ("nizhny novgorod", 66),
    ("kazan", 88),
];

/// Resolve a free-text locality name to a region id.
///
/// Never fails: empty, whitespace-only and unknown names all resolve to
/// [`DEFAULT_REGION_ID`].
pub fn resolve(name: Option<&str>) -> u32 {
    let Some(key) = name.map(normalize_name).filter(|k| !k.is_empty()) else {
        return DEFAULT_REGION_ID;
    };

    REGIONS
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, id)| *id)
        .unwrap_or(DEFAULT_REGION_ID)
}

/// True when `name` resolves to a region present in the table.
pub fn is_known(name: &str) -> bool {
    let key = normalize_name(name);
    REGIONS.iter().any(|(known, _)| *known == key)
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .replace('ё', "е")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_are_case_and_whitespace_insensitive() {
        assert_eq!(resolve(Some("Москва")), 1);
        assert_eq!(resolve(Some("  САНКТ-ПЕТЕРБУРГ ")), 2);
        assert_eq!(resolve(Some("спб")), 2);
        assert_eq!(resolve(Some("Казань")), 88);
        assert_eq!(resolve(Some("Нижний   Новгород")), 66);
        assert_eq!(resolve(Some("\tТюмень\n")), 95);
        assert_eq!(resolve(Some("Kazan")), 88);
    }

    #[test]
    fn test_yo_is_folded() {
        assert_eq!(resolve(Some("Орёл")), 69);
        assert_eq!(resolve(Some("орел")), 69);
    }

    #[test]
    fn test_every_table_entry_resolves_to_itself() {
        for (name, id) in REGIONS {
            assert_eq!(resolve(Some(name)), *id, "{name}");
            assert_eq!(resolve(Some(&name.to_uppercase())), *id, "{name}");
        }
    }

    #[test]
    fn test_unknown_and_empty_fall_back_to_default() {
        assert_eq!(resolve(None), DEFAULT_REGION_ID);
        assert_eq!(resolve(Some("")), DEFAULT_REGION_ID);
        assert_eq!(resolve(Some("   ")), DEFAULT_REGION_ID);
        assert_eq!(resolve(Some("Атлантида")), DEFAULT_REGION_ID);
    }

    #[test]
    fn test_is_known() {
        assert!(is_known(" Уфа "));
        assert!(!is_known("Атлантида"));
    }
}
