// ==========================================
// Marcenaria Track - Leitura de texto do PDF
// ==========================================
// Ferramenta: lopdf (parser PDF puro em Rust)
// Produto: fragmentos de texto com posição, por página
// ==========================================
// As etiquetas do Promob são PDFs gerados por máquina, sem rotação
// nem escala no texto; o rastreio de posição considera apenas a
// translação dos operadores Tm/Td/TD/T*.
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::manifest_importer_trait::{PdfPageText, PdfTextExtractor, PositionedText};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

// A4 em pontos, usado quando o documento não declara MediaBox
const DEFAULT_PAGE_WIDTH: f64 = 595.0;
const DEFAULT_PAGE_HEIGHT: f64 = 842.0;

// Profundidade máxima da subida Page -> Pages atrás do MediaBox herdado
const MAX_PARENT_DEPTH: usize = 4;

// ==========================================
// LopdfTextExtractor - Extrator de texto posicionado
// ==========================================
pub struct LopdfTextExtractor;

impl PdfTextExtractor for LopdfTextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> ImportResult<Vec<PdfPageText>> {
        let doc = Document::load_mem(bytes)?;
        if doc.is_encrypted() {
            return Err(ImportError::PdfPasswordProtected);
        }

        let mut pages = Vec::new();
        for (number, page_id) in doc.get_pages() {
            let (width, height) = page_size(&doc, page_id);
            let content_bytes = doc.get_page_content(page_id)?;
            let content = Content::decode(&content_bytes).map_err(|e| ImportError::PdfLayout {
                page: number,
                message: e.to_string(),
            })?;
            let texts = walk_text_operations(&content);
            debug!(page = number, fragments = texts.len(), "página lida");
            pages.push(PdfPageText {
                number,
                width,
                height,
                texts,
            });
        }
        Ok(pages)
    }
}

/// Dimensões da página, respeitando MediaBox herdado do nó Pages
fn page_size(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let mut current = Some(page_id);
    for _ in 0..MAX_PARENT_DEPTH {
        let id = match current {
            Some(id) => id,
            None => break,
        };
        let dict = match doc.get_dictionary(id) {
            Ok(d) => d,
            Err(_) => break,
        };
        if let Ok(obj) = dict.get(b"MediaBox") {
            if let Some(rect) = media_box_size(doc, obj) {
                return rect;
            }
        }
        current = dict.get(b"Parent").ok().and_then(|o| o.as_reference().ok());
    }
    (DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT)
}

/// Interpreta o retângulo [x0 y0 x1 y1] do MediaBox
fn media_box_size(doc: &Document, obj: &Object) -> Option<(f64, f64)> {
    let resolved = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut vals = [0f64; 4];
    for (i, o) in arr.iter().enumerate() {
        vals[i] = number(o)?;
    }
    let width = (vals[2] - vals[0]).abs();
    let height = (vals[3] - vals[1]).abs();
    if width <= 0.0 || height <= 0.0 {
        None
    } else {
        Some((width, height))
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Percorre o fluxo de conteúdo acumulando fragmentos de texto
fn walk_text_operations(content: &Content) -> Vec<PositionedText> {
    let mut texts = Vec::new();
    let mut line_x = 0f64;
    let mut line_y = 0f64;
    let mut leading = 0f64;
    let mut in_text = false;

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                in_text = true;
                line_x = 0.0;
                line_y = 0.0;
                leading = 0.0;
            }
            "ET" => {
                in_text = false;
            }
            // Matriz de texto: só a translação (e, f) interessa
            "Tm" => {
                if op.operands.len() == 6 {
                    if let (Some(e), Some(f)) =
                        (number(&op.operands[4]), number(&op.operands[5]))
                    {
                        line_x = e;
                        line_y = f;
                    }
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (
                    op.operands.first().and_then(number),
                    op.operands.get(1).and_then(number),
                ) {
                    line_x += tx;
                    line_y += ty;
                }
            }
            // TD = Td + define o entrelinha como -ty
            "TD" => {
                if let (Some(tx), Some(ty)) = (
                    op.operands.first().and_then(number),
                    op.operands.get(1).and_then(number),
                ) {
                    line_x += tx;
                    line_y += ty;
                    leading = -ty;
                }
            }
            "TL" => {
                if let Some(l) = op.operands.first().and_then(number) {
                    leading = l;
                }
            }
            "T*" => {
                line_y -= leading;
            }
            "Tj" => {
                if in_text {
                    push_fragment(&mut texts, line_x, line_y, op.operands.first());
                }
            }
            // ' = T* seguido de Tj
            "'" => {
                if in_text {
                    line_y -= leading;
                    push_fragment(&mut texts, line_x, line_y, op.operands.first());
                }
            }
            // " = espaçamentos + T* + Tj (string no terceiro operando)
            "\"" => {
                if in_text {
                    line_y -= leading;
                    push_fragment(&mut texts, line_x, line_y, op.operands.get(2));
                }
            }
            "TJ" => {
                if in_text {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        let joined = decode_tj_array(items);
                        if !joined.trim().is_empty() {
                            texts.push(PositionedText {
                                x: line_x,
                                y: line_y,
                                text: joined,
                            });
                        }
                    }
                }
            }
            _ => {}
        }
    }
    texts
}

fn push_fragment(texts: &mut Vec<PositionedText>, x: f64, y: f64, operand: Option<&Object>) {
    if let Some(Object::String(bytes, _)) = operand {
        let text = decode_pdf_text(bytes);
        if !text.trim().is_empty() {
            texts.push(PositionedText { x, y, text });
        }
    }
}

/// Junta os fragmentos de um TJ ignorando os ajustes de kerning
fn decode_tj_array(items: &[Object]) -> String {
    let mut joined = String::new();
    for item in items {
        if let Object::String(bytes, _) = item {
            joined.push_str(&decode_pdf_text(bytes));
        }
    }
    joined
}

/// Decodifica uma string PDF para texto
///
/// Ordem de tentativa: UTF-16BE (com BOM), UTF-8, Latin-1.
/// Etiquetas geradas com WinAnsiEncoding caem no último caso e
/// preservam os acentos ("Código", "Módulo").
pub(crate) fn decode_pdf_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
