use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Fr,
    En,
    De,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
            Language::De => "de",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "en" => Language::En,
            "de" => Language::De,
            _ => Language::Fr,
        }
    }
}

struct Rule {
    keywords: &'static [&'static str],
    fr: &'static str,
    en: &'static str,
    de: &'static str,
}

impl Rule {
    fn text(&self, lang: Language) -> &'static str {
        match lang {
            Language::Fr => self.fr,
            Language::En => self.en,
            Language::De => self.de,
        }
    }
}

/// Ordered rule table: the first rule with any keyword contained in the
/// normalized message wins. Keywords are lowercase and accent-free where the
/// accented form could be typed both ways.
const RULES: &[Rule] = &[
    Rule {
        keywords: &["bonjour", "salut", "hello", "hallo", "guten tag", "hi "],
        fr: "Bonjour et bienvenue à Dar Dhiafa Paul Klee ! Comment puis-je vous aider ?",
        en: "Hello and welcome to Dar Dhiafa Paul Klee! How can I help you?",
        de: "Hallo und willkommen im Dar Dhiafa Paul Klee! Wie kann ich Ihnen helfen?",
    },
    Rule {
        keywords: &["prix", "tarif", "price", "rate", "preis", "cost", "combien"],
        fr: "Nos chambres vont de 170 à 400 dinars la nuit selon la catégorie (Double, Twin, Familiale, Suite Royale). Petit-déjeuner inclus.",
        en: "Our rooms range from 170 to 400 dinars per night depending on the category (Double, Twin, Familiale, Suite Royale). Breakfast included.",
        de: "Unsere Zimmer kosten je nach Kategorie 170 bis 400 Dinar pro Nacht (Double, Twin, Familiale, Suite Royale). Frühstück inklusive.",
    },
    Rule {
        keywords: &["reserv", "réserv", "book", "buch", "disponib", "availab"],
        fr: "Pour réserver, choisissez vos dates dans le module de réservation : nous vous montrerons les chambres disponibles et le prix total avant confirmation.",
        en: "To book, pick your dates in the booking module: we'll show you the available rooms and the total price before you confirm.",
        de: "Zum Buchen wählen Sie Ihre Daten im Buchungsmodul: wir zeigen Ihnen die freien Zimmer und den Gesamtpreis vor der Bestätigung.",
    },
    Rule {
        keywords: &["petit-dej", "petit dej", "breakfast", "fruhstuck", "frühstück", "manger", "repas", "dinner", "food"],
        fr: "Le petit-déjeuner djerbien est servi chaque matin dans le patio. Sur demande, nous préparons aussi un dîner traditionnel.",
        en: "A Djerbian breakfast is served every morning in the patio. On request we also prepare a traditional dinner.",
        de: "Jeden Morgen servieren wir ein djerbisches Frühstück im Innenhof. Auf Wunsch bereiten wir auch ein traditionelles Abendessen zu.",
    },
    Rule {
        keywords: &["adresse", "address", "trouve", "where", "wo ist", "djerba", "houmt", "comment venir", "directions"],
        fr: "La maison d'hôtes se trouve dans la médina de Houmt Souk, à Djerba, à 15 minutes de l'aéroport. Nous vous envoyons l'itinéraire détaillé après réservation.",
        en: "The guesthouse sits in the medina of Houmt Souk, Djerba, 15 minutes from the airport. We send detailed directions after booking.",
        de: "Das Gästehaus liegt in der Medina von Houmt Souk auf Djerba, 15 Minuten vom Flughafen. Eine genaue Wegbeschreibung senden wir nach der Buchung.",
    },
    Rule {
        keywords: &["activit", "experience", "expérience", "excursion", "ausflug", "visite", "tour", "plage", "beach"],
        fr: "Nous organisons des balades dans la médina, des sorties en mer et des ateliers de cuisine. Demandez le programme à votre arrivée !",
        en: "We organize medina walks, boat trips and cooking workshops. Ask for the program when you arrive!",
        de: "Wir organisieren Medina-Spaziergänge, Bootsausflüge und Kochworkshops. Fragen Sie bei der Ankunft nach dem Programm!",
    },
    Rule {
        keywords: &["contact", "kontakt", "telephone", "téléphone", "phone", "email", "mail", "joindre"],
        fr: "Vous pouvez nous joindre au +216 75 000 000 ou par email à contact@dardhiafa.tn.",
        en: "You can reach us at +216 75 000 000 or by email at contact@dardhiafa.tn.",
        de: "Sie erreichen uns unter +216 75 000 000 oder per E-Mail an contact@dardhiafa.tn.",
    },
    Rule {
        keywords: &["merci", "thank", "danke", "au revoir", "bye", "tschuss", "tschüss"],
        fr: "Merci à vous ! À très bientôt à Dar Dhiafa Paul Klee.",
        en: "Thank you! See you soon at Dar Dhiafa Paul Klee.",
        de: "Vielen Dank! Bis bald im Dar Dhiafa Paul Klee.",
    },
];

const FALLBACK_FR: &str =
    "Je n'ai pas bien compris. Posez-moi une question sur les chambres, les prix, les réservations ou les activités.";
const FALLBACK_EN: &str =
    "I didn't quite understand. Ask me about rooms, prices, bookings or activities.";
const FALLBACK_DE: &str =
    "Das habe ich nicht verstanden. Fragen Sie mich nach Zimmern, Preisen, Buchungen oder Aktivitäten.";

/// First matching rule wins; unmatched input gets the per-language fallback.
pub fn reply(message: &str, lang: Language) -> &'static str {
    let normalized = message.to_lowercase();
    for rule in RULES {
        if rule.keywords.iter().any(|kw| normalized.contains(kw)) {
            return rule.text(lang);
        }
    }
    match lang {
        Language::Fr => FALLBACK_FR,
        Language::En => FALLBACK_EN,
        Language::De => FALLBACK_DE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_matches() {
        let r = reply("Bonjour !", Language::Fr);
        assert!(r.contains("bienvenue"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(reply("HELLO there", Language::En), reply("hello there", Language::En));
    }

    #[test]
    fn test_language_selects_response() {
        let fr = reply("Quel est le prix ?", Language::Fr);
        let en = reply("what is the price?", Language::En);
        let de = reply("was ist der Preis?", Language::De);
        assert!(fr.contains("chambres"));
        assert!(en.contains("rooms"));
        assert!(de.contains("Zimmer"));
    }

    #[test]
    fn test_first_match_wins() {
        // "bonjour" (greeting rule) appears before "prix" (pricing rule)
        let r = reply("bonjour, quel est le prix ?", Language::Fr);
        assert!(r.contains("bienvenue"));
    }

    #[test]
    fn test_accented_and_plain_spellings() {
        assert_eq!(reply("je veux réserver", Language::Fr), reply("je veux reserver", Language::Fr));
    }

    #[test]
    fn test_fallback() {
        assert_eq!(reply("xyzzy", Language::En), FALLBACK_EN);
        assert_eq!(reply("", Language::Fr), FALLBACK_FR);
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("en"), Language::En);
        assert_eq!(Language::parse("de"), Language::De);
        assert_eq!(Language::parse("fr"), Language::Fr);
        assert_eq!(Language::parse("anything"), Language::Fr);
    }
}
