//! Payment receipt rendering.
//!
//! A receipt is a single A4 page with a title and eight fixed lines. The PDF
//! renderer writes the document directly: two standard Type1 fonts, one
//! content stream, and a cross-reference table, which is all a text-only page
//! needs.

use crate::errors::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Write as _;

/// Everything printed on a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptData {
    /// Payment being receipted
    pub payment_id: i64,
    /// Tenant full name or username
    pub tenant_name: String,
    /// Amount paid
    pub amount: f64,
    /// Currency printed after the amount
    pub currency: String,
    /// Period label, e.g. `"Juin 2025"`
    pub period: String,
    /// Payment type label
    pub kind_label: String,
    /// When the payment was made
    pub paid_at: DateTime<Utc>,
    /// Property the payment relates to
    pub property_id: i64,
    /// Administrator who validated the payment
    pub validator_name: String,
    /// Date the receipt was produced
    pub generated_on: NaiveDate,
}

impl ReceiptData {
    /// Receipt lines in print order, title excluded.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Tenant : {}", self.tenant_name),
            format!("Amount paid : {:.2} {}", self.amount, self.currency),
            format!("Period : {}", self.period),
            format!("Payment type : {}", self.kind_label),
            format!("Payment date : {}", self.paid_at.format("%d/%m/%Y %H:%M")),
            format!("Property ID : {}", self.property_id),
            format!("Validated by : {}", self.validator_name),
            format!("Generated on : {}", self.generated_on.format("%d/%m/%Y")),
        ]
    }
}

/// Turns receipt data into a document.
pub trait ReceiptRenderer: Send + Sync {
    /// File extension of produced documents, without the dot.
    fn extension(&self) -> &'static str;

    /// Renders the document bytes.
    ///
    /// # Errors
    /// Implementations return an error when the document cannot be produced.
    fn render(&self, data: &ReceiptData) -> Result<Vec<u8>>;
}

/// One-page PDF receipts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReceiptRenderer;

const TITLE: &str = "PAYMENT RECEIPT";
const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const TITLE_POS: (u32, u32) = (200, 800);
const FIRST_LINE_POS: (u32, u32) = (100, 770);
const LINE_STEP: u32 = 20;

impl ReceiptRenderer for PdfReceiptRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, data: &ReceiptData) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        push_text(&mut content, "F2", 16, TITLE_POS, TITLE);
        let (x, top) = FIRST_LINE_POS;
        let mut y = top;
        for line in data.lines() {
            push_text(&mut content, "F1", 12, (x, y), &line);
            y -= LINE_STEP;
        }

        let page = format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>"
        );
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(&content);
        stream.extend_from_slice(b"\nendstream");

        let objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
            page.into_bytes(),
            font("Helvetica"),
            font("Helvetica-Bold"),
            stream,
        ];

        Ok(assemble(&objects))
    }
}

fn font(base: &str) -> Vec<u8> {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
        .into_bytes()
}

fn push_text(out: &mut Vec<u8>, font: &str, size: u32, (x, y): (u32, u32), text: &str) {
    out.extend_from_slice(format!("BT /{font} {size} Tf {x} {y} Td (").as_bytes());
    out.extend_from_slice(&encode_literal(text));
    out.extend_from_slice(b") Tj ET\n");
}

/// Encodes text for a PDF literal string in `WinAnsiEncoding`.
///
/// Latin-1 characters map to themselves; anything outside becomes `?`.
fn encode_literal(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                bytes.push(b'\\');
                bytes.push(c as u8);
            }
            ' '..='~' | '\u{a0}'..='\u{ff}' => bytes.push(u8::try_from(u32::from(c)).unwrap_or(b'?')),
            _ => bytes.push(b'?'),
        }
    }
    bytes
}

fn assemble(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_at = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(xref, "{offset:010} 00000 n ");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    );
    out.extend_from_slice(xref.as_bytes());
    out
}
