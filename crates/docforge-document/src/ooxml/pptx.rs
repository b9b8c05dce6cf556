// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Presentation renderer. A title slide always comes first, followed by one
// content slide per explicit slide or, failing that, per section.

use docforge_core::error::{DocforgeError, Result};
use docforge_core::types::{
    Artifact, Document, DocumentBody, DocumentKind, PresentationBody, Section, Slide, SlideLayout,
};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument};

use super::core_props::CoreProperties;
use super::package::{PackageWriter, Relationship, part_names, read_part};
use super::xml::{XmlWriter, xml_error};
use crate::render::{Renderer, wrong_body};
use crate::text::paragraphs;

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_SLIDE_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_PRES_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
const CT_VIEW_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
const CT_TABLE_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
const REL_VIEW_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
const REL_TABLE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

// 16:9 in EMU.
const SLIDE_WIDTH: i64 = 12_192_000;
const SLIDE_HEIGHT: i64 = 6_858_000;
const MARGIN: i64 = 457_200;

const MASTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr><a:defRPr sz="4400"/></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr><a:defRPr sz="2400"/></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:otherStyle></p:txStyles></p:sldMaster>"#;

const LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#;

const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Docforge"><a:themeElements><a:clrScheme name="Docforge"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F3864"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="2F5496"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Docforge"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Docforge"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

const PRES_PROPS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentationPr xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#;

const VIEW_PROPS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:viewPr xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:normalViewPr><p:restoredLeft sz="15620"/><p:restoredTop sz="94660"/></p:normalViewPr><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#;

const TABLE_STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:tblStyleLst xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" def="{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}"/>"#;

/// Renders presentations as 16:9 `.pptx` decks.
#[derive(Debug, Default, Clone, Copy)]
pub struct PptxRenderer;

impl Renderer for PptxRenderer {
    fn kinds(&self) -> &'static [DocumentKind] {
        &[DocumentKind::Presentation]
    }

    #[instrument(skip_all, fields(id = %document.id))]
    fn render(&self, document: &Document) -> Result<Artifact> {
        let DocumentBody::Presentation(deck) = &document.body else {
            return Err(wrong_body(document, "presentation"));
        };
        let slides = resolve_slides(document, deck)?;

        let mut package = PackageWriter::new();
        let mut pres_rels = vec![Relationship::new(
            "rId1",
            REL_SLIDE_MASTER,
            "slideMasters/slideMaster1.xml",
        )];
        for (index, slide) in slides.iter().enumerate() {
            let number = index + 1;
            package.add_part(
                &format!("ppt/slides/slide{number}.xml"),
                CT_SLIDE,
                &slide_xml(slide)?,
            )?;
            package.add_relationships(
                &format!("ppt/slides/_rels/slide{number}.xml.rels"),
                &[Relationship::new(
                    "rId1",
                    REL_SLIDE_LAYOUT,
                    "../slideLayouts/slideLayout1.xml",
                )],
            )?;
            pres_rels.push(Relationship::new(
                slide_rel_id(index),
                REL_SLIDE,
                format!("slides/slide{number}.xml"),
            ));
        }
        let next = slides.len() + 2;
        pres_rels.extend([
            Relationship::new(format!("rId{next}"), REL_THEME, "theme/theme1.xml"),
            Relationship::new(format!("rId{}", next + 1), REL_PRES_PROPS, "presProps.xml"),
            Relationship::new(format!("rId{}", next + 2), REL_VIEW_PROPS, "viewProps.xml"),
            Relationship::new(
                format!("rId{}", next + 3),
                REL_TABLE_STYLES,
                "tableStyles.xml",
            ),
        ]);

        package.add_part(
            "ppt/presentation.xml",
            CT_PRESENTATION,
            &presentation_xml(slides.len())?,
        )?;
        package.add_relationships("ppt/_rels/presentation.xml.rels", &pres_rels)?;
        package.add_part(
            "ppt/slideMasters/slideMaster1.xml",
            CT_SLIDE_MASTER,
            MASTER_XML.as_bytes(),
        )?;
        package.add_relationships(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &[
                Relationship::new("rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                Relationship::new("rId2", REL_THEME, "../theme/theme1.xml"),
            ],
        )?;
        package.add_part(
            "ppt/slideLayouts/slideLayout1.xml",
            CT_SLIDE_LAYOUT,
            LAYOUT_XML.as_bytes(),
        )?;
        package.add_relationships(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &[Relationship::new(
                "rId1",
                REL_SLIDE_MASTER,
                "../slideMasters/slideMaster1.xml",
            )],
        )?;
        package.add_part("ppt/theme/theme1.xml", CT_THEME, THEME_XML.as_bytes())?;
        package.add_part("ppt/presProps.xml", CT_PRES_PROPS, PRES_PROPS_XML.as_bytes())?;
        package.add_part("ppt/viewProps.xml", CT_VIEW_PROPS, VIEW_PROPS_XML.as_bytes())?;
        package.add_part(
            "ppt/tableStyles.xml",
            CT_TABLE_STYLES,
            TABLE_STYLES_XML.as_bytes(),
        )?;
        package.add_core_properties(&CoreProperties::for_document(document).to_xml()?)?;
        package.add_package_rels("ppt/presentation.xml")?;
        let bytes = package.finish()?;

        debug!(slides = slides.len(), bytes_len = bytes.len(), "pptx rendered");
        Ok(Artifact::new(&document.id, DocumentKind::Presentation, bytes))
    }
}

/// Master is rId1, slides follow from rId2.
fn slide_rel_id(index: usize) -> String {
    format!("rId{}", index + 2)
}

/// The deck as it will be written: title slide first, then content.
fn resolve_slides(document: &Document, deck: &PresentationBody) -> Result<Vec<Slide>> {
    let content: Vec<Slide> = if !deck.slides.is_empty() {
        deck.slides.clone()
    } else {
        deck.sections.iter().map(section_slide).collect()
    };
    if content.is_empty() {
        return Err(DocforgeError::render(
            &document.id,
            "presentation has neither slides nor sections",
        ));
    }

    let mut slides = Vec::with_capacity(content.len() + 1);
    if content[0].layout != SlideLayout::Title {
        slides.push(title_slide(document, deck));
    }
    slides.extend(content);
    Ok(slides)
}

fn title_slide(document: &Document, deck: &PresentationBody) -> Slide {
    let subtitle = deck.subtitle.clone().unwrap_or_else(|| {
        format!(
            "{}, {}",
            document.author,
            document.timestamp.format("%Y-%m-%d")
        )
    });
    Slide {
        layout: SlideLayout::Title,
        title: deck.title.clone(),
        subtitle: Some(subtitle),
        bullets: Vec::new(),
        content: None,
    }
}

/// Lines starting with `-` or `*` become bullets; anything else is prose.
fn section_slide(section: &Section) -> Slide {
    let mut bullets = Vec::new();
    let mut prose = Vec::new();
    for line in section.content.lines().map(str::trim) {
        if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            bullets.push(item.trim().to_string());
        } else if !line.is_empty() {
            prose.push(line);
        }
    }
    Slide {
        layout: SlideLayout::Content,
        title: section.heading.clone(),
        subtitle: None,
        bullets,
        content: (!prose.is_empty()).then(|| prose.join("\n")),
    }
}

fn presentation_xml(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start(
        "p:presentation",
        &[
            ("xmlns:a", NS_A),
            ("xmlns:r", REL_BASE),
            ("xmlns:p", NS_P),
            ("saveSubsetFonts", "1"),
        ],
    )?;
    xml.start("p:sldMasterIdLst", &[])?;
    xml.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    xml.end("p:sldMasterIdLst")?;

    xml.start("p:sldIdLst", &[])?;
    for index in 0..slide_count {
        // Slide ids start at 256.
        let id = (256 + index).to_string();
        xml.empty("p:sldId", &[("id", &id), ("r:id", &slide_rel_id(index))])?;
    }
    xml.end("p:sldIdLst")?;

    let (cx, cy) = (SLIDE_WIDTH.to_string(), SLIDE_HEIGHT.to_string());
    xml.empty("p:sldSz", &[("cx", &cx), ("cy", &cy)])?;
    xml.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;
    xml.end("p:presentation")?;
    Ok(xml.into_bytes())
}

/// One text box on a slide.
struct TextBox<'a> {
    name: &'a str,
    y: i64,
    height: i64,
    size: u32,
    bold: bool,
    centered: bool,
}

fn slide_xml(slide: &Slide) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start(
        "p:sld",
        &[("xmlns:a", NS_A), ("xmlns:r", REL_BASE), ("xmlns:p", NS_P)],
    )?;
    xml.start("p:cSld", &[])?;
    xml.start("p:spTree", &[])?;
    xml.start("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGrpSpPr")?;
    xml.empty("p:grpSpPr", &[])?;

    match slide.layout {
        SlideLayout::Title => {
            let title = TextBox {
                name: "Title",
                y: SLIDE_HEIGHT / 3,
                height: 1_371_600,
                size: 4400,
                bold: true,
                centered: true,
            };
            text_box(&mut xml, 2, &title, &[Paragraph::plain(&slide.title)])?;
            if let Some(subtitle) = &slide.subtitle {
                let sub = TextBox {
                    name: "Subtitle",
                    y: SLIDE_HEIGHT / 3 + 1_371_600,
                    height: 914_400,
                    size: 2400,
                    bold: false,
                    centered: true,
                };
                text_box(&mut xml, 3, &sub, &[Paragraph::plain(subtitle)])?;
            }
        }
        SlideLayout::Content => {
            let title = TextBox {
                name: "Title",
                y: MARGIN,
                height: 1_143_000,
                size: 3600,
                bold: true,
                centered: false,
            };
            text_box(&mut xml, 2, &title, &[Paragraph::plain(&slide.title)])?;

            let mut body: Vec<Paragraph<'_>> = Vec::new();
            if let Some(content) = &slide.content {
                body.extend(paragraphs(content).into_iter().map(Paragraph::owned));
            }
            body.extend(slide.bullets.iter().map(|b| Paragraph::bullet(b)));
            if !body.is_empty() {
                let text = TextBox {
                    name: "Content",
                    y: MARGIN + 1_143_000 + 228_600,
                    height: SLIDE_HEIGHT - 2 * MARGIN - 1_371_600,
                    size: 2000,
                    bold: false,
                    centered: false,
                };
                text_box(&mut xml, 3, &text, &body)?;
            }
        }
    }

    xml.end("p:spTree")?;
    xml.end("p:cSld")?;
    xml.start("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.end("p:clrMapOvr")?;
    xml.end("p:sld")?;
    Ok(xml.into_bytes())
}

struct Paragraph<'a> {
    text: std::borrow::Cow<'a, str>,
    bullet: bool,
}

impl<'a> Paragraph<'a> {
    fn plain(text: &'a str) -> Self {
        Self {
            text: text.into(),
            bullet: false,
        }
    }

    fn owned(text: String) -> Self {
        Self {
            text: text.into(),
            bullet: false,
        }
    }

    fn bullet(text: &'a str) -> Self {
        Self {
            text: text.into(),
            bullet: true,
        }
    }
}

fn text_box(xml: &mut XmlWriter, id: u32, shape: &TextBox<'_>, body: &[Paragraph<'_>]) -> Result<()> {
    let id = id.to_string();
    let (x, y) = (MARGIN.to_string(), shape.y.to_string());
    let (cx, cy) = ((SLIDE_WIDTH - 2 * MARGIN).to_string(), shape.height.to_string());
    let size = shape.size.to_string();

    xml.start("p:sp", &[])?;
    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", &id), ("name", shape.name)])?;
    xml.empty("p:cNvSpPr", &[("txBox", "1")])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvSpPr")?;

    xml.start("p:spPr", &[])?;
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", &x), ("y", &y)])?;
    xml.empty("a:ext", &[("cx", &cx), ("cy", &cy)])?;
    xml.end("a:xfrm")?;
    xml.start("a:prstGeom", &[("prst", "rect")])?;
    xml.empty("a:avLst", &[])?;
    xml.end("a:prstGeom")?;
    xml.empty("a:noFill", &[])?;
    xml.end("p:spPr")?;

    xml.start("p:txBody", &[])?;
    xml.start("a:bodyPr", &[("wrap", "square"), ("rtlCol", "0")])?;
    xml.empty("a:normAutofit", &[])?;
    xml.end("a:bodyPr")?;
    xml.empty("a:lstStyle", &[])?;
    for paragraph in body {
        xml.start("a:p", &[])?;
        if paragraph.bullet {
            xml.start("a:pPr", &[("marL", "342900"), ("indent", "-342900")])?;
            xml.empty("a:buFont", &[("typeface", "Arial")])?;
            xml.empty("a:buChar", &[("char", "\u{2022}")])?;
            xml.end("a:pPr")?;
        } else if shape.centered {
            xml.empty("a:pPr", &[("algn", "ctr")])?;
        }
        xml.start("a:r", &[])?;
        let bold = if shape.bold { "1" } else { "0" };
        xml.empty(
            "a:rPr",
            &[("lang", "pl-PL"), ("sz", &size), ("b", bold), ("dirty", "0")],
        )?;
        xml.element("a:t", &[], &paragraph.text)?;
        xml.end("a:r")?;
        xml.end("a:p")?;
    }
    xml.end("p:txBody")?;
    xml.end("p:sp")
}

// -- Reading ----------------------------------------------------------------

/// Text of every slide in deck order, one string per paragraph.
pub fn slide_texts(package: &[u8]) -> Result<Vec<Vec<String>>> {
    let count = part_names(package)?
        .iter()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .count();

    (1..=count)
        .map(|number| read_slide(&read_part(package, &format!("ppt/slides/slide{number}.xml"))?))
        .collect()
}

fn read_slide(text: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(text);
    let mut out = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.name().as_ref() {
                b"a:p" => current = Some(String::new()),
                b"a:t" => in_text = true,
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(paragraph) = current.as_mut() {
                    paragraph.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => out.extend(current.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}
