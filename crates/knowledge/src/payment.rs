//! Payment-link lookup over the knowledge base.
//!
//! When the agent profile has no payment-provider URL configured,
//! `send_payment_link` falls back to searching the tenant's published chunks
//! for a URL-bearing fragment. Scoring is keyword-based, not embedding-based:
//! payment vocabulary weighs 10, any URL weighs 5, and each query token of 4+
//! characters found in the chunk weighs 1. Highest score wins; ties keep the
//! original chunk order.

use respondo_core::crm::KnowledgeChunk;

const KEYWORD_WEIGHT: u32 = 10;
const URL_WEIGHT: u32 = 5;
const TOKEN_WEIGHT: u32 = 1;
const MIN_TOKEN_LEN: usize = 4;

/// Payment vocabulary, pt-BR first.
const PAYMENT_KEYWORDS: &[&str] = &[
    "pagamento",
    "pagar",
    "pix",
    "boleto",
    "cobrança",
    "checkout",
    "fatura",
    "payment",
];

/// Find the checkout URL in the best-scoring URL-bearing chunk, if any.
pub fn find_payment_link(chunks: &[KnowledgeChunk], description: &str) -> Option<String> {
    let mut best: Option<(u32, &KnowledgeChunk)> = None;

    for chunk in chunks {
        if extract_url(&chunk.content).is_none() {
            continue;
        }
        let score = score_chunk(chunk, description);
        // Strictly greater keeps the first chunk on ties.
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, chunk));
        }
    }

    best.and_then(|(_, chunk)| extract_url(&chunk.content))
}

/// Score one chunk against the requested description.
pub fn score_chunk(chunk: &KnowledgeChunk, description: &str) -> u32 {
    let text = format!("{} {}", chunk.title, chunk.content).to_lowercase();
    let mut score = 0;

    if PAYMENT_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        score += KEYWORD_WEIGHT;
    }

    if extract_url(&chunk.content).is_some() {
        score += URL_WEIGHT;
    }

    let description = description.to_lowercase();
    for token in description.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric());
        if token.chars().count() >= MIN_TOKEN_LEN && text.contains(token) {
            score += TOKEN_WEIGHT;
        }
    }

    score
}

/// The first http(s) URL in a text, trimmed of trailing punctuation.
pub fn extract_url(text: &str) -> Option<String> {
    let start = text.find("https://").or_else(|| text.find("http://"))?;
    let rest = &text[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let url = rest[..end].trim_end_matches([')', ']', '.', ',', ';']);
    (!url.is_empty()).then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, title: &str, content: &str) -> KnowledgeChunk {
        KnowledgeChunk {
            id: id.into(),
            tenant_id: "t-1".into(),
            agent_id: None,
            title: title.into(),
            content: content.into(),
            content_type: "article".into(),
            published: true,
            embedding: None,
        }
    }

    #[test]
    fn extracts_url_and_trims_punctuation() {
        assert_eq!(
            extract_url("Pague em https://pay.example.com/plano-anual."),
            Some("https://pay.example.com/plano-anual".to_string())
        );
        assert_eq!(extract_url("sem link aqui"), None);
    }

    #[test]
    fn payment_keywords_outrank_plain_urls() {
        let chunks = vec![
            chunk("k-1", "Sobre nós", "Visite https://example.com/sobre"),
            chunk("k-2", "Pagamento", "Link de pagamento: https://pay.example.com/checkout"),
        ];
        assert_eq!(
            find_payment_link(&chunks, "link"),
            Some("https://pay.example.com/checkout".to_string())
        );
    }

    #[test]
    fn token_overlap_breaks_keyword_ties() {
        let chunks = vec![
            chunk("k-1", "Pagamento mensal", "Plano mensal: https://pay.example.com/mensal"),
            chunk("k-2", "Pagamento anual", "Plano anual: https://pay.example.com/anual"),
        ];
        assert_eq!(
            find_payment_link(&chunks, "quero o plano anual"),
            Some("https://pay.example.com/anual".to_string())
        );
    }

    #[test]
    fn equal_scores_keep_original_order() {
        let chunks = vec![
            chunk("k-1", "Pagamento", "https://pay.example.com/um"),
            chunk("k-2", "Pagamento", "https://pay.example.com/dois"),
        ];
        assert_eq!(
            find_payment_link(&chunks, "xx"),
            Some("https://pay.example.com/um".to_string())
        );
    }

    #[test]
    fn chunks_without_urls_never_win() {
        let chunks = vec![
            chunk("k-1", "Pagamento pix boleto", "Aceitamos pix e boleto."),
            chunk("k-2", "Contato", "Fale conosco em https://example.com/contato"),
        ];
        assert_eq!(
            find_payment_link(&chunks, "pix"),
            Some("https://example.com/contato".to_string())
        );
    }

    #[test]
    fn no_url_bearing_chunk_returns_none() {
        let chunks = vec![chunk("k-1", "Pagamento", "Aceitamos pix.")];
        assert_eq!(find_payment_link(&chunks, "pix"), None);
    }

    #[test]
    fn short_tokens_do_not_score() {
        let c = chunk("k-1", "FAQ", "https://example.com/faq sobre o uso");
        // "o" and "uso" are under 4 chars; only the URL weight applies.
        assert_eq!(score_chunk(&c, "o uso"), URL_WEIGHT);
    }
}
