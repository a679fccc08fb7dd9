//! Keyword matching over the catalog: menu pre-filtering and the scored fallback pick.

use crate::domain::model::Venue;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

/// Dish name → substrings that identify it in a request or a menu.
const DISH_KEYWORDS: &[(&str, &[&str])] = &[
    ("піца", &["піц", "pizza"]),
    ("паста", &["паст", "спагеті", "pasta"]),
    ("бургер", &["бургер", "burger", "гамбургер"]),
    ("суші", &["суш", "sushi", "рол"]),
    ("салат", &["салат", "salad"]),
    ("хумус", &["хумус", "hummus"]),
    ("фалафель", &["фалафель", "falafel"]),
    ("шаурма", &["шаурм", "shawarma"]),
    ("стейк", &["стейк", "steak", "мясо"]),
    ("риба", &["риб", "fish", "лосось"]),
    ("курка", &["курк", "курич", "chicken"]),
    ("десерт", &["десерт", "торт", "тірамісу", "морозиво"]),
];

/// Occasion → (request keywords, venue keywords).
const OCCASION_KEYWORDS: &[(&str, &[&str], &[&str])] = &[
    (
        "romantic",
        &["романт", "побачен", "двох", "інтимн", "затишн"],
        &["інтимн", "романт", "для пар", "затишн"],
    ),
    (
        "family",
        &["сім", "діт", "родин", "батьк"],
        &["сімейн", "діт", "родин"],
    ),
    (
        "business",
        &["діл", "зустріч", "перегов", "бізнес"],
        &["діл", "зустріч", "бізнес"],
    ),
    (
        "friends",
        &["друз", "компан", "гуртом", "весел"],
        &["компан", "друз", "молодіжн"],
    ),
    (
        "quick",
        &["швидк", "перекус", "фаст", "поспіша"],
        &["швидк", "casual", "фаст"],
    ),
    (
        "celebration",
        &["святкув", "день народж", "ювіле", "свято"],
        &["святков", "простор", "груп"],
    ),
];

const OCCASION_MATCH_POINTS: u32 = 5;
const TOP_CANDIDATES: usize = 3;

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn dish_keywords(dish: &str) -> &'static [&'static str] {
    DISH_KEYWORDS
        .iter()
        .find(|(name, _)| *name == dish)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

/// Dishes the request asks for, in table order.
pub fn requested_dishes(request: &str) -> Vec<&'static str> {
    let request = request.to_lowercase();
    DISH_KEYWORDS
        .iter()
        .filter(|(_, keywords)| contains_any(&request, keywords))
        .map(|(dish, _)| *dish)
        .collect()
}

/// Narrows the list to venues serving a requested dish.
///
/// Returns the input unchanged when the request names no dish, or when no venue
/// serves any of the requested dishes.
pub fn filter_by_menu(request: &str, venues: &[Venue]) -> Vec<Venue> {
    let dishes = requested_dishes(request);
    if dishes.is_empty() {
        tracing::info!("🔍 General request, considering all venues");
        return venues.to_vec();
    }

    tracing::info!("🍽 User is looking for specific dishes: {:?}", dishes);

    let filtered: Vec<Venue> = venues
        .iter()
        .filter(|venue| {
            let menu = venue.field_or("menu", "").to_lowercase();
            match dishes
                .iter()
                .find(|dish| contains_any(&menu, dish_keywords(dish)))
            {
                Some(dish) => {
                    tracing::debug!("   ✅ {} serves {}", venue.name(), dish);
                    true
                }
                None => {
                    tracing::debug!("   ❌ {} has none of the requested dishes", venue.name());
                    false
                }
            }
        })
        .cloned()
        .collect();

    if filtered.is_empty() {
        tracing::warn!("⚠️ No venue serves the requested dishes, keeping all");
        venues.to_vec()
    } else {
        tracing::info!(
            "📋 Narrowed down to {} venues with the requested dishes",
            filtered.len()
        );
        filtered
    }
}

/// Deterministic part of the fallback score: points for each occasion the request
/// and the venue's vibe/aim/cuisine both mention.
pub fn score_venue(request: &str, venue: &Venue) -> u32 {
    let request = request.to_lowercase();
    let profile = format!(
        "{} {} {}",
        venue.field_or("vibe", ""),
        venue.field_or("aim", ""),
        venue.field_or("cuisine", "")
    )
    .to_lowercase();

    OCCASION_KEYWORDS
        .iter()
        .filter(|(_, user_keywords, venue_keywords)| {
            contains_any(&request, user_keywords) && contains_any(&profile, venue_keywords)
        })
        .count() as u32
        * OCCASION_MATCH_POINTS
}

/// Picks a venue without the model: score plus jitter, then a random one of the top three.
pub fn fallback_pick<R: Rng + ?Sized>(request: &str, venues: &[Venue], rng: &mut R) -> Option<Venue> {
    if venues.is_empty() {
        return None;
    }

    let mut scored: Vec<(f64, &Venue)> = venues
        .iter()
        .map(|venue| {
            let jitter: f64 = rng.gen_range(0.0..2.0);
            (score_venue(request, venue) as f64 + jitter, venue)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let chosen = if scored[0].0 > 0.0 {
        let top = &scored[..TOP_CANDIDATES.min(scored.len())];
        let (_, venue) = top.choose(rng)?;
        tracing::info!("🎯 Fallback picked {} (random among top {})", venue.name(), top.len());
        *venue
    } else {
        let venue = venues.choose(rng)?;
        tracing::info!("🎲 Fallback picked {} at random", venue.name());
        venue
    };

    Some(chosen.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn venue(name: &str, menu: &str, vibe: &str, aim: &str) -> Venue {
        Venue::from_pairs([
            ("name", name),
            ("menu", menu),
            ("vibe", vibe),
            ("aim", aim),
            ("cuisine", "європейська"),
        ])
    }

    #[test]
    fn test_requested_dishes_matches_case_insensitively() {
        assert_eq!(requested_dishes("Хочу ПІЦУ і суші"), vec!["піца", "суші"]);
        assert_eq!(requested_dishes("burger please"), vec!["бургер"]);
        assert!(requested_dishes("місце для обіду").is_empty());
    }

    #[test]
    fn test_filter_by_menu_keeps_matching_venues() {
        let venues = vec![
            venue("Napoli", "Піца маргарита, паста", "", ""),
            venue("Tokyo", "Суші сети", "", ""),
            venue("Grill", "Стейки", "", ""),
        ];
        let filtered = filter_by_menu("шукаю піцу", &venues);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name(), "Napoli");
    }

    #[test]
    fn test_filter_by_menu_returns_all_when_nothing_matches() {
        let venues = vec![venue("Tokyo", "Суші", "", ""), venue("Grill", "Стейки", "", "")];
        assert_eq!(filter_by_menu("хочу фалафель", &venues).len(), 2);
        assert_eq!(filter_by_menu("просто поїсти", &venues).len(), 2);
    }

    #[test]
    fn test_filter_by_menu_handles_missing_menu_column() {
        let venues = vec![Venue::from_pairs([("name", "No menu")])];
        assert_eq!(filter_by_menu("піца", &venues).len(), 1);
    }

    #[test]
    fn test_score_venue_counts_occasion_matches() {
        let romantic = venue("Amore", "", "Затишна інтимна атмосфера", "для пар");
        let family = venue("Kids", "", "Сімейний", "з дітьми");

        assert_eq!(score_venue("побачення для двох", &romantic), 5);
        assert_eq!(score_venue("побачення для двох", &family), 0);
        assert_eq!(score_venue("обід з сім'єю та дітьми", &family), 5);
        assert_eq!(score_venue("просто їсти", &romantic), 0);
    }

    #[test]
    fn test_fallback_pick_prefers_matching_venue() {
        let venues = vec![
            venue("Amore", "", "романтичний", "для пар"),
            venue("Fast", "", "casual", "перекус"),
            venue("Biz", "", "діловий", "зустрічі"),
            venue("Kids", "", "сімейний", "діти"),
        ];

        // Amore scores 5 + jitter and always lands in the top three
        let amore_picks = (0..30)
            .filter(|seed| {
                let mut rng = StdRng::seed_from_u64(*seed);
                fallback_pick("романтичне побачення", &venues, &mut rng)
                    .map(|v| v.name() == "Amore")
                    .unwrap_or(false)
            })
            .count();
        assert!(amore_picks > 0);

        let single = vec![venues[0].clone()];
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            fallback_pick("будь-що", &single, &mut rng).unwrap().name(),
            "Amore"
        );
    }

    #[test]
    fn test_fallback_pick_on_empty_catalog() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(fallback_pick("піца", &[], &mut rng).is_none());
    }
}
