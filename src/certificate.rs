//! PDF certificate issued for each anchored submission

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use qrcode::QrCode;
use thiserror::Error;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;

/// Printed side length of the QR code
const QR_SIZE_MM: f32 = 42.0;

/// Approximate Helvetica glyph width relative to font size, for centering
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Millimetres per PostScript point
const MM_PER_PT: f32 = 0.3528;

const INTEGRITY_STATEMENT: &str = "This certificate verifies that your tax data has been \
cryptographically hashed and stored on the blockchain, ensuring its integrity and immutability.";

#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] printpdf::Error),
}

/// Everything printed on a certificate
#[derive(Debug, Clone)]
pub struct CertificateDetails {
    pub certificate_id: String,
    pub user_id: String,
    pub data_hash: String,
    pub chain_record_id: String,
    pub tx_hash: String,
    pub block_number: u64,
    /// RFC3339 issue time
    pub issued_at: String,
    /// Block explorer link for the transaction
    pub explorer_url: String,
}

/// Writes lines top-down on a single page
struct PageWriter {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    cursor_mm: f32,
}

impl PageWriter {
    fn line(&mut self, text: &str, size_pt: f32, bold: bool, centered: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        let x = if centered {
            let width = text.chars().count() as f32 * size_pt * AVG_GLYPH_WIDTH * MM_PER_PT;
            ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM)
        } else {
            MARGIN_MM
        };

        self.cursor_mm -= size_pt * MM_PER_PT * 1.5;
        self.layer
            .use_text(text, size_pt, Mm(x), Mm(self.cursor_mm), font);
    }

    /// Wrap a paragraph to the printable width
    fn paragraph(&mut self, text: &str, size_pt: f32) {
        let usable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
        let max_chars = (usable / (size_pt * AVG_GLYPH_WIDTH * MM_PER_PT)) as usize;

        for line in wrap(text, max_chars.max(1)) {
            self.line(&line, size_pt, false, false);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.cursor_mm -= mm;
    }

    /// Draw the QR code centered below the cursor, one filled square per dark module
    fn qr(&mut self, code: &QrCode) {
        let width = code.width();
        let module_mm = QR_SIZE_MM / width as f32;
        let left = (PAGE_WIDTH_MM - QR_SIZE_MM) / 2.0;
        let top = self.cursor_mm - 4.0;

        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));

        for (index, color) in code.to_colors().into_iter().enumerate() {
            if color != qrcode::Color::Dark {
                continue;
            }
            let x = left + (index % width) as f32 * module_mm;
            let y = top - (index / width) as f32 * module_mm;
            self.layer.add_rect(Rect::new(
                Mm(x),
                Mm(y - module_mm),
                Mm(x + module_mm),
                Mm(y),
            ));
        }

        self.cursor_mm = top - QR_SIZE_MM;
    }
}

/// Greedy word wrap; words longer than a line are split
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();

        if current_len > 0 && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
        }

        if word_len > max_chars {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = piece.iter().collect();
            }
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Render the certificate as PDF bytes
pub fn render_certificate(details: &CertificateDetails) -> Result<Vec<u8>, CertificateError> {
    let (doc, page, layer) = PdfDocument::new(
        "Tax Integrity Certificate",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Certificate",
    );

    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut writer = PageWriter {
        layer: doc.get_page(page).get_layer(layer),
        regular,
        bold,
        cursor_mm: PAGE_HEIGHT_MM - MARGIN_MM,
    };

    writer.line("DhanRakshak", 20.0, true, true);
    writer.line("Tax Integrity Certificate", 16.0, false, true);
    writer.gap(4.0);
    writer.line(
        &format!("Certificate ID: {}", details.certificate_id),
        10.0,
        false,
        true,
    );
    writer.gap(6.0);

    writer.line("Verification Details:", 12.0, true, false);
    writer.gap(2.0);
    writer.line(&format!("User ID: {}", details.user_id), 10.0, false, false);
    writer.line(
        &format!("Data Hash (SHA-256): {}", details.data_hash),
        10.0,
        false,
        false,
    );
    writer.line(
        &format!("Blockchain Record ID: {}", details.chain_record_id),
        10.0,
        false,
        false,
    );
    writer.line(
        &format!("Transaction Hash: {}", details.tx_hash),
        10.0,
        false,
        false,
    );
    writer.line(
        &format!("Block Number: {}", details.block_number),
        10.0,
        false,
        false,
    );
    writer.line(&format!("Timestamp: {}", details.issued_at), 10.0, false, false);
    writer.gap(4.0);
    writer.paragraph(
        &format!("Blockchain Explorer: {}", details.explorer_url),
        10.0,
    );
    writer.gap(4.0);
    writer.paragraph(INTEGRITY_STATEMENT, 9.0);
    writer.gap(4.0);

    match QrCode::new(details.explorer_url.as_bytes()) {
        Ok(code) => writer.qr(&code),
        Err(e) => {
            tracing::error!("QR code generation error: {}", e);
            writer.line("(QR code generation failed)", 10.0, false, true);
        }
    }

    Ok(doc.save_to_bytes()?)
}
