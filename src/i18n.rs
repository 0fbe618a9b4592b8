use serde::{Deserialize, Serialize};

/// Languages the catalog ships messages for. The web client negotiates the
/// language through a `lang` query parameter; unknown tags fall back to
/// English, matching the dictionary fallback on the frontend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Pt,
    #[default]
    En,
}

impl Lang {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pt" | "pt-br" => Lang::Pt,
            _ => Lang::En,
        }
    }
}

pub fn required_name(lang: Lang) -> &'static str {
    match lang {
        Lang::En => "Name and brand are required.",
        Lang::Pt => "Nome e marca são obrigatórios.",
    }
}

pub fn calculation_error(lang: Lang) -> &'static str {
    match lang {
        Lang::En => "Error calculating the nutritional score. Please check the entered values.",
        Lang::Pt => "Erro ao calcular o score nutricional. Verifique os valores informados.",
    }
}

pub fn server_error(lang: Lang) -> &'static str {
    match lang {
        Lang::En => "Error communicating with the server.",
        Lang::Pt => "Erro ao comunicar com o servidor.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tags_fall_back_to_english() {
        assert_eq!(Lang::from_tag("pt"), Lang::Pt);
        assert_eq!(Lang::from_tag("PT-BR"), Lang::Pt);
        assert_eq!(Lang::from_tag("en"), Lang::En);
        assert_eq!(Lang::from_tag("de"), Lang::En);
        assert_eq!(Lang::from_tag(""), Lang::En);
    }
}
