//! Generative-service prompt assembly.

use chef_core::Message;

/// Built-in Mega Chef persona preamble.
pub const DEFAULT_PERSONA: &str = "Você é um assistente culinário virtual chamado Mega Chef da Computaria. Seu principal objetivo é ajudar as pessoas com receitas e dicas culinárias.

Você deve:
1. Focar principalmente em ajudar com receitas, ingredientes e técnicas culinárias
2. Perguntar sobre restrições alimentares e ingredientes disponíveis
3. Oferecer sugestões de receitas baseadas nos ingredientes que a pessoa tem
4. Dar dicas de preparo e truques culinários
5. Adaptar receitas para diferentes restrições alimentares
6. Sugerir harmonizações de pratos e bebidas
7. Compartilhar dicas para melhorar habilidades culinárias

Sobre o clima e horário:
- Só forneça informações sobre o clima quando o usuário explicitamente perguntar
- Só forneça informações sobre data/hora quando o usuário explicitamente perguntar
- Use as informações do clima para sugerir receitas apropriadas
- Não inicie conversas sobre clima ou horário, foque em culinária

Mantenha um tom amigável e profissional, sempre priorizando o tema culinário.";

/// Persona preamble prepended to every prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Persona(String);

impl Default for Persona {
    fn default() -> Self {
        Self(DEFAULT_PERSONA.to_string())
    }
}

impl Persona {
    /// A user's override wins over the global persona; blank values fall
    /// through to the built-in one.
    pub fn resolve(user_override: Option<&str>, global: Option<&str>) -> Self {
        let chosen = [user_override, global]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|p| !p.is_empty());
        match chosen {
            Some(p) => Self(p.to_string()),
            None => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Shorthand for [`Persona::resolve`] returning the text.
pub fn resolve_persona(user_override: Option<&str>, global: Option<&str>) -> String {
    Persona::resolve(user_override, global).0
}

/// Persona, then up to `max_turns` recent messages, then the current question.
pub fn build_prompt(persona: &str, history: &[Message], current: &str, max_turns: usize) -> String {
    let start = history.len().saturating_sub(max_turns);
    let recent = &history[start..];

    let mut block = String::new();
    if !recent.is_empty() {
        block.push_str("Histórico da conversa:\n");
        for message in recent {
            block.push_str(message.role.prompt_label());
            block.push_str(": ");
            block.push_str(&message.text);
            block.push('\n');
        }
    }

    format!(
        "{}\n\n{}\nPergunta atual do usuário: {}",
        persona, block, current
    )
}
