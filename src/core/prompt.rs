use crate::domain::model::Venue;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

const SYSTEM_PROMPT: &str =
    "Ти експерт-ресторатор. Обирай варіанти різноманітно, не зациклюй на одному закладі.";

const SELECTION_HINTS: [&str; 5] = [
    "Якщо запит про романтику → обирай інтимну атмосферу",
    "Якщо згадані діти/сім'я → обирай сімейні заклади",
    "Якщо швидкий перекус → обирай casual формат",
    "Якщо особлива кухня → враховуй тип кухні",
    "Якщо святкування → обирай просторні заклади",
];

/// A numbered candidate list plus instructions, ready to send to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoicePrompt {
    pub system: String,
    pub user: String,
    pub candidates: usize,
}

impl ChoicePrompt {
    pub fn build<R: Rng + ?Sized>(request: &str, candidates: &[Venue], rng: &mut R) -> Self {
        let details = candidates
            .iter()
            .enumerate()
            .map(|(i, venue)| {
                format!(
                    "Варіант {}:\n- Назва: {}\n- Кухня: {}\n- Атмосфера: {}\n- Підходить для: {}",
                    i + 1,
                    venue.field_or("name", "Без назви"),
                    venue.field_or("cuisine", "Не вказана"),
                    venue.field_or("vibe", "Не описана"),
                    venue.field_or("aim", "Не вказано"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let hints: Vec<&str> = SELECTION_HINTS.choose_multiple(rng, 2).copied().collect();

        let user = format!(
            "ЗАПИТ: \"{request}\"\n\n\
             ВАРІАНТИ ЗАКЛАДІВ:\n{details}\n\n\
             ПРАВИЛА ВИБОРУ:\n\
             - Уважно проаналізуй запит на ключові слова\n\
             - {}\n\
             - {}\n\
             - НЕ завжди обирай перший варіант\n\
             - Розглядай ВСІ варіанти перед вибором\n\n\
             Поверни номер найкращого варіанту (1-{})",
            hints[0],
            hints[1],
            candidates.len()
        );

        Self {
            system: SYSTEM_PROMPT.to_string(),
            user,
            candidates: candidates.len(),
        }
    }
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9]+").expect("valid number regex"))
}

/// Reads the first number in the model's answer as a 1-based choice.
///
/// Returns the 0-based index, or `None` when there is no number or it is out of range.
pub fn parse_choice(answer: &str, candidates: usize) -> Option<usize> {
    let number: usize = number_pattern().find(answer)?.as_str().parse().ok()?;
    (1..=candidates).contains(&number).then(|| number - 1)
}
