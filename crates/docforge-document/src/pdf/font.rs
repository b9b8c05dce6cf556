// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded text-layer font: the bundled TrueType font as a Type0 composite
// font with Identity-H encoding.
//
// Strings are written as two-byte glyph ids. A /ToUnicode CMap maps every
// glyph that was used back to its character, so extraction returns the
// original text including letters outside WinAnsi.

use std::collections::BTreeMap;

use ab_glyph::{Font, FontRef};
use docforge_core::error::{DocforgeError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use unicode_normalization::UnicodeNormalization;

use crate::font::{FONT_DATA, FONT_NAME, bundled_font};

/// Upper bound on entries in one `beginbfchar` block.
const BFCHAR_CHUNK: usize = 100;

/// PDF glyph space is 1000 units per em.
const GLYPH_SPACE: f32 = 1000.0;

/// Records which glyphs a document shows and writes the font objects.
pub struct EmbeddedFont {
    font: FontRef<'static>,
    used: BTreeMap<u16, char>,
}

impl EmbeddedFont {
    pub fn new() -> Result<Self> {
        Ok(Self {
            font: bundled_font()?,
            used: BTreeMap::new(),
        })
    }

    /// Encode `text` as a hexadecimal string of big-endian glyph ids.
    ///
    /// Text is composed (NFC) first so accented letters hit the precomposed
    /// glyphs. Characters the font lacks become glyph 0 and extract as
    /// U+FFFD.
    pub fn encode(&mut self, text: &str) -> Object {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for c in text.nfc() {
            let gid = self.font.glyph_id(c).0;
            if gid != 0 {
                self.used.entry(gid).or_insert(c);
            }
            bytes.extend_from_slice(&gid.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    /// CMap from glyph ids back to UTF-16BE.
    pub fn to_unicode_cmap(&self) -> String {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n\
             <0000> <FFFF>\n\
             endcodespacerange\n",
        );
        let entries: Vec<(&u16, &char)> = self.used.iter().collect();
        for chunk in entries.chunks(BFCHAR_CHUNK) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                let mut units = [0u16; 2];
                let utf16: String = c
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|unit| format!("{unit:04X}"))
                    .collect();
                cmap.push_str(&format!("<{gid:04X}> <{utf16}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str(
            "endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\n\
             end\n",
        );
        cmap
    }

    /// Add the Type0 font, its CIDFont, descriptor, font file and CMap to
    /// `doc`, storing the Type0 dictionary under `font_id`.
    pub fn write_into(&self, doc: &mut Document, font_id: ObjectId) -> Result<()> {
        let units_per_em = self.font.units_per_em().unwrap_or(2048.0);
        let scale = |units: f32| (units * GLYPH_SPACE / units_per_em).round() as i64;

        let advance = scale(self.font.h_advance_unscaled(self.font.glyph_id('M')));
        let ascent = scale(self.font.ascent_unscaled());
        let descent = scale(self.font.descent_unscaled());
        let cap_height = self
            .font
            .outline(self.font.glyph_id('H'))
            .map(|outline| scale(outline.bounds.min.y.max(outline.bounds.max.y)))
            .unwrap_or(ascent);

        let mut font_file = Stream::new(
            dictionary! { "Length1" => FONT_DATA.len() as i64 },
            FONT_DATA.to_vec(),
        );
        font_file
            .compress()
            .map_err(|err| DocforgeError::PdfError(format!("failed to compress font: {err}")))?;
        let font_file_id = doc.add_object(font_file);

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => FONT_NAME,
            // Fixed pitch, nonsymbolic.
            "Flags" => 33,
            "FontBBox" => vec![
                Object::Integer(0),
                Object::Integer(descent),
                Object::Integer(advance),
                Object::Integer(ascent),
            ],
            "ItalicAngle" => 0,
            "Ascent" => ascent,
            "Descent" => descent,
            "CapHeight" => cap_height,
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => FONT_NAME,
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => advance,
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id = doc.add_object(Stream::new(
            Dictionary::new(),
            self.to_unicode_cmap().into_bytes(),
        ));

        doc.objects.insert(
            font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => FONT_NAME,
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![Object::Reference(cid_font_id)],
                "ToUnicode" => to_unicode_id,
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_bytes(object: &Object) -> Vec<u8> {
        match object {
            Object::String(bytes, StringFormat::Hexadecimal) => bytes.clone(),
            other => panic!("expected a hex string, got {other:?}"),
        }
    }

    #[test]
    fn polish_letters_get_their_own_glyphs() {
        let mut font = EmbeddedFont::new().unwrap();
        let bytes = hex_bytes(&font.encode("zapłaty ąę"));
        assert_eq!(bytes.len(), "zapłaty ąę".chars().count() * 2);

        let gids: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        assert!(gids.iter().all(|gid| *gid != 0));
        // 'ł' and 'l' are different glyphs.
        assert_ne!(gids[3], font.font.glyph_id('l').0);
    }

    #[test]
    fn decomposed_input_is_composed() {
        let mut composed = EmbeddedFont::new().unwrap();
        let mut decomposed = EmbeddedFont::new().unwrap();
        assert_eq!(
            hex_bytes(&composed.encode("ż")),
            hex_bytes(&decomposed.encode("z\u{0307}"))
        );
    }

    #[test]
    fn cmap_maps_used_glyphs_back_to_characters() {
        let mut font = EmbeddedFont::new().unwrap();
        font.encode("Łł");

        let cmap = font.to_unicode_cmap();
        let upper = font.font.glyph_id('Ł').0;
        let lower = font.font.glyph_id('ł').0;
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains(&format!("<{upper:04X}> <0141>")));
        assert!(cmap.contains(&format!("<{lower:04X}> <0142>")));
        assert!(cmap.contains("<0000> <FFFF>"));
    }

    #[test]
    fn large_alphabets_are_split_into_blocks() {
        let mut font = EmbeddedFont::new().unwrap();
        let text: String = ('!'..='~').chain('À'..='ž').collect();
        font.encode(&text);
        let cmap = font.to_unicode_cmap();
        let blocks = cmap.matches("beginbfchar").count();
        assert!(blocks >= 2);
        assert_eq!(blocks, cmap.matches("endbfchar").count());
    }
}
