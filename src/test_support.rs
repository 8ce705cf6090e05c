//! Fixtures shared by the unit tests.

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::config::{
    AppConfig, AuthConfig, ContextConfig, DatabaseConfig, ExtractionConfig, FeatureFlags,
    LlmConfig, ServerConfig, StoreBackend,
};
use crate::middleware::auth::Claims;

pub const TEST_SECRET: &str = "test-secret";

/// Build a minimal PDF with one page per entry, each drawn in Helvetica.
/// An empty entry produces a page without a content stream.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let page_count = pages.len();
    // 1: catalog, 2: pages, 3: font, then one object per page followed by
    // the content streams of the non-blank pages.
    let page_id = |i: usize| 4 + i;
    let mut next_id = 4 + page_count;

    let mut objects: Vec<(usize, String)> = Vec::new();
    objects.push((1, "<< /Type /Catalog /Pages 2 0 R >>".to_string()));

    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", page_id(i))).collect();
    objects.push((
        2,
        format!("<< /Type /Pages /Kids [{}] /Count {page_count} >>", kids.join(" ")),
    ));
    objects.push((
        3,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ));

    for (i, text) in pages.iter().enumerate() {
        let resources = "/Resources << /Font << /F1 3 0 R >> >>";
        if text.is_empty() {
            objects.push((
                page_id(i),
                format!("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] {resources} >>"),
            ));
            continue;
        }

        let content_id = next_id;
        next_id += 1;
        objects.push((
            page_id(i),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] {resources} /Contents {content_id} 0 R >>"
            ),
        ));
        let escaped = text
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        let stream = format!("BT /F1 12 Tf 72 720 Td ({escaped}) Tj ET");
        objects.push((
            content_id,
            format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
        ));
    }

    objects.sort_by_key(|(id, _)| *id);
    let size = objects.last().map(|(id, _)| id + 1).unwrap_or(1);

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = vec![0usize; size];
    for (id, body) in &objects {
        offsets[*id] = out.len();
        out.extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    let xref_start = out.len();
    let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
    for offset in &offsets[1..] {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.extend_from_slice(xref.as_bytes());
    out.extend_from_slice(
        format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_start}\n%%EOF\n")
            .as_bytes(),
    );
    out
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        auth: AuthConfig {
            jwt_secret: TEST_SECRET.into(),
            issuer: None,
        },
        database: DatabaseConfig {
            backend: StoreBackend::Memory,
            url: String::new(),
            max_connections: 1,
            acquire_timeout_secs: 1,
        },
        llm: LlmConfig {
            provider: "gemini".into(),
            model: "gemini-2.0-flash".into(),
            api_key: String::new(),
            system_prompt: "You are a helpful assistant.".into(),
        },
        extraction: ExtractionConfig {
            max_upload_bytes: 10 * 1024 * 1024,
            chunk_size: 1000,
            chunk_overlap: 200,
            use_pdftotext: true,
            timeout_secs: 30,
        },
        context: ContextConfig {
            chunk_size: 4000,
            chunk_overlap: 200,
        },
        features: FeatureFlags {
            pdf_upload_enabled: true,
        },
    }
}

/// A bearer token for `user_id` signed with [`TEST_SECRET`].
pub fn token_for(user_id: &str) -> String {
    sign(user_id, None)
}

/// Like [`token_for`], with an `iss` claim.
pub fn token_with_issuer(user_id: &str, issuer: &str) -> String {
    sign(user_id, Some(issuer.to_string()))
}

fn sign(user_id: &str, iss: Option<String>) -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        name: None,
        email: None,
        iss,
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}
