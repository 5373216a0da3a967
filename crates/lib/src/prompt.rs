//! Prompt templates for the completion request.
//!
//! The template is a policy value: the relay renders whatever template it was built with.
//! Two presets ship with the crate; config may select one or supply its own text.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the user's message text.
pub const MESSAGE_PLACEHOLDER: &str = "{message}";

const BRIEF_TEMPLATE: &str = r#"Tu es inspiré du livre "Dis-moi où tu as mal, je te dirai pourquoi".
Analyse cette douleur : "{message}" et donne une cause possible en termes émotionnels.
Réponds de manière claire, bienveillante et synthétique."#;

const STRUCTURED_TEMPLATE: &str = r#"Tu es un expert inspiré du livre "Dis-moi où tu as mal, je te dirai pourquoi" de Michel Odoul.
Ton objectif est de fournir des pistes de réflexion émotionnelle de manière interactive et bienveillante pour un bot WhatsApp.

Analyse la douleur suivante : "{message}".

Pour ta réponse, tu DOIS respecter scrupuleusement le format en 6 points ci-dessous. Sépare chaque point par "---" pour que je puisse les transformer en messages WhatsApp distincts.

1.  **Introduction :** Un message très court qui confirme la prise en compte de la douleur.
2.  **Symbolique principale :** Explique la fonction principale de cette partie du corps et sa symbolique émotionnelle clé. Utilise du **gras** et un emoji pertinent.
3.  **Pistes d'analyse :** Donne 2 ou 3 causes possibles sous forme de liste à puces (avec des tirets). Termine ce message par une question ouverte pour inciter l'utilisateur à réfléchir.
4.  **Enrichissement (si pertinent) :** Ajoute une distinction gauche/droite (gauche = affectif/familial, droite = social/matériel). Si cette distinction n'est pas applicable à la douleur, écris simplement : "Pas de distinction spécifique pour cette zone."
5.  **Interaction :** Propose à l'utilisateur d'explorer 1 ou 2 zones du corps qui sont liées ou complémentaires à sa douleur initiale pour l'encourager à continuer la conversation.
6.  **Disclaimer :** Termine TOUJOURS par ce message de sécurité obligatoire et identique : "IMPORTANT : Cet outil est une source de réflexion et ne remplace en aucun cas un avis médical. Pour toute douleur, consultez un professionnel de santé.""#;

/// Built-in prompt selected by `completion.prompt` in config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptPreset {
    /// One short emotional-cause analysis.
    Brief,
    /// Six-point analysis separated by `---`, ending with the medical disclaimer.
    #[default]
    Structured,
}

impl PromptPreset {
    pub fn template(self) -> PromptTemplate {
        match self {
            PromptPreset::Brief => PromptTemplate::new(BRIEF_TEMPLATE),
            PromptPreset::Structured => PromptTemplate::new(STRUCTURED_TEMPLATE),
        }
    }
}

/// Template text with a `{message}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Substitute every placeholder with `message`. A template without a placeholder gets the
    /// message appended after a blank line so the user's text always reaches the model.
    pub fn render(&self, message: &str) -> String {
        if self.text.contains(MESSAGE_PLACEHOLDER) {
            self.text.replace(MESSAGE_PLACEHOLDER, message)
        } else {
            format!("{}\n\n{}", self.text.trim_end(), message)
        }
    }
}
