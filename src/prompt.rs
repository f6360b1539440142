//! Grounded prompt assembly.
//!
//! Blends a fixed instruction preamble with the retrieved passage text into
//! the single system-role string sent to the completion endpoint. Hits with
//! nested sub-matches contribute the sub-match texts joined by a separator
//! line; otherwise the top-level source field is used. No deduplication,
//! truncation, or token budgeting happens here.

use crate::models::Hit;

/// Separator between nested sub-match passages from the same hit.
const INNER_HIT_SEPARATOR: &str = "\n --- \n";

/// Fixed instruction rules prepended to every prompt.
const PREAMBLE: &str = "Petunjuk:

- Kamu adalah AI Assisten yang hanya menjawab pertanyaan berdasarkan konteks berikut ini. Jika kamu tidak bisa menjawab pertanyaannya menggunakan konteks ini, cukup jawab \"Saya tidak tahu\"
- Jawab pertanyaan dengan jujur dan berdasarkan fakta dengan hanya menggunakan konteks yang disajikan.
- Jika Anda tidak tahu jawabannya, katakan saja bahwa Anda tidak tahu, jangan mengarang jawaban.
- Anda harus selalu mengutip dokumen tempat jawaban diambil menggunakan gaya kutipan akademis sebaris [], dengan menggunakan posisi.
- Gunakan format markdown untuk contoh kode.
- Anda benar, berdasarkan fakta, tepat, dan dapat diandalkan.";

/// Assemble the system instruction string for a set of retrieved hits.
///
/// `field` is the primary source text field of the collection. An empty hit
/// list still produces a well-formed prompt with an empty context section.
pub fn build_prompt(hits: &[Hit], field: &str) -> String {
    let mut context = String::new();

    for hit in hits {
        if let Some(texts) = hit.inner_hit_texts(field) {
            context.push_str(&texts.join(INNER_HIT_SEPARATOR));
        } else if let Some(text) = hit.source_text(field) {
            context.push_str(text);
            context.push('\n');
        }
    }

    format!("{}\n\nKonteks:\n{}", PREAMBLE, context)
}
