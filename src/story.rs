//! Opening crawl copy.

const STORY_LINES: &[&str] = &[
    "A long time ago, in a galaxy far, far away...",
    "The Star Wars saga unfolds, with tales of",
    "tragedy and heartbreak that leave a lingering",
    "sadness in their wake.",
    "",
    "Darth Vader, once a promising Jedi Knight, now",
    "consumed by the darkness, roams the galaxy as",
    "a symbol of lost innocence and broken trust.",
    "",
    "Obi-Wan Kenobi, a seasoned Jedi Master, carries",
    "the weight of past failures on his weary shoulders.",
    "Regret fills his heart as he reflects on battles",
    "lost and friendships shattered.",
    "",
    "The galaxy, torn by endless conflict, bears the",
    "scars of war. Planets ravaged, families torn apart,",
    "and dreams crushed under the oppressive rule of the",
    "Empire. A somber reminder of the cost of freedom.",
    "",
    "In every corner of the galaxy, hope flickers like",
    "a dying star. The memories of better days, the",
    "laughter and camaraderie, now distant echoes that",
    "fade with each passing moment.",
    "",
    "And amidst the darkness, a new glimmer emerges.",
    "A young Jedi, known as Xander Drakon, rises",
    "from the shadows, their destiny entwined with",
    "the fate of the universe. Will they have the",
    "strength to wield the Force and bring balance",
    "to the galaxy once more?",
    "",
    "And so, the Star Wars saga continues, a tale of",
    "sadness and resilience, reminding us that even in",
    "the face of overwhelming darkness, the smallest",
    "spark of hope can ignite a new dawn.",
    "",
    "",
    "",
];

/// The story, one crawl line per `\n`-separated line.
pub fn story_text() -> String {
    STORY_LINES.join("\n")
}

/// Surround `text` with `padding` newlines on each side.
pub fn pad_lines(text: &str, padding: usize) -> String {
    let pad = "\n".repeat(padding);
    format!("{pad}{text}{pad}")
}
