//! System prompt composition.
//!
//! `compose` is a pure function: the same context always yields the same
//! prompt, byte for byte. Section order is fixed so that behavioural
//! rules always close the prompt, after any retrieved content.

use respondo_core::{
    AgentProfile, Company, Contact, ContactMemory, KnowledgeSnippet, Opportunity, ToolDefinition,
};
use std::fmt::Write;

/// Memory facts included in the prompt, most recent last.
pub const MAX_PROMPT_FACTS: usize = 8;
/// Feedback rules included in the prompt; extra rules are dropped silently.
pub const MAX_FEEDBACK_RULES: usize = 20;

/// Everything the composer needs, gathered by the caller.
pub struct PromptContext<'a> {
    pub profile: &'a AgentProfile,
    pub contact: &'a Contact,
    pub company: Option<&'a Company>,
    pub opportunities: &'a [Opportunity],
    pub memory: Option<&'a ContactMemory>,
    pub tools: &'a [ToolDefinition],
    pub knowledge: &'a [KnowledgeSnippet],
}

pub fn compose(ctx: &PromptContext<'_>) -> String {
    let profile = ctx.profile;
    let mut out = String::with_capacity(2048);

    let _ = writeln!(
        out,
        "Você é {}, um assistente de vendas e atendimento de um CRM.",
        profile.name
    );
    let _ = writeln!(out, "Tom de comunicação: {}.", profile.tone);
    let _ = writeln!(out, "\nSeu objetivo: {}", profile.goal);

    if let Some(instructions) = &profile.custom_instructions {
        if !instructions.trim().is_empty() {
            let _ = writeln!(out, "\nInstruções adicionais:\n{instructions}");
        }
    }

    out.push_str("\n## Contato\n");
    let _ = writeln!(out, "Nome: {}", ctx.contact.name);
    if let Some(email) = &ctx.contact.email {
        let _ = writeln!(out, "Email: {email}");
    }
    if let Some(phone) = &ctx.contact.phone {
        let _ = writeln!(out, "Telefone: {phone}");
    }
    let _ = writeln!(out, "Estágio: {}", ctx.contact.lifecycle_stage);

    if let Some(company) = ctx.company {
        out.push_str("\n## Empresa\n");
        let _ = writeln!(out, "Nome: {}", company.name);
        if let Some(industry) = &company.industry {
            let _ = writeln!(out, "Setor: {industry}");
        }
        if let Some(website) = &company.website {
            let _ = writeln!(out, "Site: {website}");
        }
    }

    if !ctx.opportunities.is_empty() {
        out.push_str("\n## Oportunidades abertas\n");
        for opp in ctx.opportunities {
            let _ = writeln!(
                out,
                "- {} (R$ {},{:02})",
                opp.title,
                opp.amount_cents / 100,
                opp.amount_cents % 100
            );
        }
    }

    if let Some(memory) = ctx.memory {
        write_memory(&mut out, memory);
    }

    if !ctx.tools.is_empty() {
        out.push_str("\n## Ferramentas disponíveis\n");
        for tool in ctx.tools {
            let _ = write!(out, "- {}: {}", tool.name, tool.description);
            if let Some(hint) = profile.tool_hints.get(&tool.name) {
                let _ = write!(out, " ({hint})");
            }
            out.push('\n');
        }
    }

    if !ctx.knowledge.is_empty() {
        out.push_str("\n## Base de conhecimento\n");
        for snippet in ctx.knowledge {
            let _ = writeln!(out, "### {}\n{}", snippet.title, snippet.content);
        }
    }

    let rules = profile.active_feedback_rules(MAX_FEEDBACK_RULES);
    if !rules.is_empty() {
        out.push_str("\n## Orientações do gestor\n");
        for rule in rules {
            let _ = writeln!(out, "- {}", rule.instruction);
        }
    }

    out.push_str(CLOSING_RULES);
    out
}

fn write_memory(out: &mut String, memory: &ContactMemory) {
    let has_anything = !memory.facts.is_empty()
        || !memory.objections.is_empty()
        || memory.next_action.is_some()
        || !memory.qualification.is_empty();
    if !has_anything {
        return;
    }

    out.push_str("\n## O que você já sabe sobre este contato\n");

    let skip = memory.facts.len().saturating_sub(MAX_PROMPT_FACTS);
    for fact in &memory.facts[skip..] {
        let _ = writeln!(out, "- {fact}");
    }

    if !memory.objections.is_empty() {
        out.push_str("Objeções levantadas:\n");
        for objection in &memory.objections {
            let _ = writeln!(out, "- {objection}");
        }
    }

    if let Some(next_action) = &memory.next_action {
        let _ = write!(out, "Próxima ação combinada: {next_action}");
        if let Some(date) = memory.next_action_date {
            let _ = write!(out, " ({})", date.format("%d/%m/%Y"));
        }
        out.push('\n');
    }

    if !memory.qualification.is_empty() {
        out.push_str("Qualificação:\n");
        for (key, value) in &memory.qualification {
            let _ = writeln!(out, "- {key}: {value}");
        }
    }
}

/// Behavioural rules that close every prompt, after all retrieved content.
const CLOSING_RULES: &str = "\n## Regras obrigatórias\n\
- Responda sempre em linguagem natural, de forma clara e objetiva.\n\
- Nunca invente chaves PIX, QR codes, dados bancários ou links de checkout.\n\
- Para enviar cobranças ou links de pagamento, use exclusivamente a ferramenta send_payment_link.\n\
- Nunca prometa prazos, descontos ou condições que não estejam nas informações acima.\n\
- Se não souber responder, diga que vai verificar com a equipe e use transfer_to_human quando apropriado.\n";

#[cfg(test)]
mod tests {
    use super::*;
    use respondo_core::FeedbackRule;
    use serde_json::json;

    fn profile() -> AgentProfile {
        serde_json::from_value(json!({
            "id": "ag-1",
            "tenant_id": "t-1",
            "name": "Sofia",
            "tone": "amigável e direto",
            "goal": "qualificar leads e agendar demonstrações",
            "enabled_tools": ["update_contact"],
            "provider": "anthropic"
        }))
        .unwrap()
    }

    fn contact() -> Contact {
        Contact {
            id: "c-1".into(),
            tenant_id: "t-1".into(),
            name: "Marina".into(),
            email: Some("marina@example.com".into()),
            phone: None,
            company_id: None,
            lifecycle_stage: "lead".into(),
        }
    }

    fn base_ctx<'a>(profile: &'a AgentProfile, contact: &'a Contact) -> PromptContext<'a> {
        PromptContext {
            profile,
            contact,
            company: None,
            opportunities: &[],
            memory: None,
            tools: &[],
            knowledge: &[],
        }
    }

    #[test]
    fn compose_is_deterministic() {
        let profile = profile();
        let contact = contact();
        let ctx = base_ctx(&profile, &contact);
        assert_eq!(compose(&ctx), compose(&ctx));
    }

    #[test]
    fn sections_appear_in_order() {
        let mut profile = profile();
        profile.feedback_rules.push(FeedbackRule {
            instruction: "Evite mensagens longas".into(),
            active: true,
        });
        let contact = contact();
        let knowledge = vec![KnowledgeSnippet {
            title: "Planos".into(),
            content: "Plano Pro custa R$ 99/mês.".into(),
            content_type: "faq".into(),
        }];
        let mut ctx = base_ctx(&profile, &contact);
        ctx.knowledge = &knowledge;

        let prompt = compose(&ctx);
        let persona = prompt.find("Você é Sofia").unwrap();
        let goal = prompt.find("Seu objetivo").unwrap();
        let contact_pos = prompt.find("## Contato").unwrap();
        let knowledge_pos = prompt.find("## Base de conhecimento").unwrap();
        let rules_pos = prompt.find("## Orientações do gestor").unwrap();
        let closing = prompt.find("## Regras obrigatórias").unwrap();
        assert!(persona < goal);
        assert!(goal < contact_pos);
        assert!(contact_pos < knowledge_pos);
        assert!(knowledge_pos < rules_pos);
        assert!(rules_pos < closing);
    }

    #[test]
    fn closing_rules_follow_everything_else() {
        let profile = profile();
        let contact = contact();
        let prompt = compose(&base_ctx(&profile, &contact));
        assert!(prompt.ends_with(CLOSING_RULES));
        assert!(prompt.contains("Nunca invente chaves PIX"));
    }

    #[test]
    fn memory_keeps_only_recent_facts() {
        let profile = profile();
        let contact = contact();
        let mut memory = ContactMemory::empty("t-1", "c-1");
        for i in 0..12 {
            memory.push_fact(&format!("fato {i}"));
        }
        let mut ctx = base_ctx(&profile, &contact);
        ctx.memory = Some(&memory);

        let prompt = compose(&ctx);
        assert!(!prompt.contains("fato 3"));
        assert!(prompt.contains("fato 4"));
        assert!(prompt.contains("fato 11"));
        // Chronological order is preserved.
        assert!(prompt.find("fato 4").unwrap() < prompt.find("fato 11").unwrap());
    }

    #[test]
    fn feedback_rules_are_capped() {
        let mut profile = profile();
        for i in 0..30 {
            profile.feedback_rules.push(FeedbackRule {
                instruction: format!("regra {i}"),
                active: true,
            });
        }
        let contact = contact();
        let prompt = compose(&base_ctx(&profile, &contact));
        assert!(prompt.contains("regra 19"));
        assert!(!prompt.contains("regra 20"));
    }

    #[test]
    fn inactive_feedback_rules_are_skipped() {
        let mut profile = profile();
        profile.feedback_rules.push(FeedbackRule {
            instruction: "regra desativada".into(),
            active: false,
        });
        let contact = contact();
        let prompt = compose(&base_ctx(&profile, &contact));
        assert!(!prompt.contains("regra desativada"));
    }

    #[test]
    fn tool_hints_are_appended() {
        let mut profile = profile();
        profile
            .tool_hints
            .insert("update_contact".into(), "sempre confirme o email".into());
        let contact = contact();
        let tools = vec![ToolDefinition {
            name: "update_contact".into(),
            description: "Atualiza dados do contato".into(),
            parameters: json!({"type": "object"}),
        }];
        let mut ctx = base_ctx(&profile, &contact);
        ctx.tools = &tools;

        let prompt = compose(&ctx);
        assert!(prompt.contains("update_contact: Atualiza dados do contato (sempre confirme o email)"));
    }
}
