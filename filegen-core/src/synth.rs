//! Artifact Synthesizer - Profile Layouts Rendered to SVG
//!
//! Pure: the same profile and text always yield the same bytes.
//! The label is inserted without escaping; callers keep markup out of it.

use serde::{Deserialize, Serialize};

use crate::hashing::sha256_hex;
use crate::profiles::ProfileId;

pub const SVG_MEDIA_TYPE: &str = "image/svg+xml";

/// Label used when no literal text is supplied.
pub const DEFAULT_LABEL: &str = "DEMO";

/// File name stem used when no literal text is supplied.
pub const DEFAULT_FILE_STEM: &str = "design";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedArtifact {
    pub profile: ProfileId,
    pub text_content: String,
    pub suggested_file_name: String,
    pub media_type: String,
    pub content_hash: String,
}

impl SynthesizedArtifact {
    pub fn bytes(&self) -> &[u8] {
        self.text_content.as_bytes()
    }
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Rect { x: f32, y: f32, w: f32, h: f32, rx: f32 },
    Circle { cx: f32, cy: f32, r: f32 },
    Path(&'static str),
}

impl Shape {
    fn to_svg(self) -> String {
        match self {
            Shape::Rect { x, y, w, h, rx } => format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}"/>"#,
                x, y, w, h, rx
            ),
            Shape::Circle { cx, cy, r } => {
                format!(r#"<circle cx="{}" cy="{}" r="{}"/>"#, cx, cy, r)
            }
            Shape::Path(d) => format!(r#"<path d="{}"/>"#, d),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Label {
    x: f32,
    y: f32,
    size: f32,
}

/// Page size in millimetres, cut outline, secondary guides and label placement.
#[derive(Debug, Clone, Copy)]
struct Layout {
    width: u32,
    height: u32,
    cut_color: &'static str,
    outline: &'static [Shape],
    guides: &'static [Shape],
    label: Label,
}

const HAIRLINE: f32 = 0.1;
const GUIDE_COLOR: &str = "#0000FF";

fn layout_for(profile: ProfileId) -> Layout {
    match profile {
        // wall-mount base plate with two screw holes
        ProfileId::ThreeD => Layout {
            width: 120,
            height: 60,
            cut_color: "#2D2D2D",
            outline: &[Shape::Rect { x: 10.0, y: 10.0, w: 100.0, h: 40.0, rx: 4.0 }],
            guides: &[
                Shape::Circle { cx: 20.0, cy: 30.0, r: 3.0 },
                Shape::Circle { cx: 100.0, cy: 30.0, r: 3.0 },
            ],
            label: Label { x: 60.0, y: 35.0, size: 14.0 },
        },
        // coaster
        ProfileId::Laser => Layout {
            width: 100,
            height: 100,
            cut_color: "#FF0000",
            outline: &[Shape::Circle { cx: 50.0, cy: 50.0, r: 45.0 }],
            guides: &[Shape::Circle { cx: 50.0, cy: 50.0, r: 38.0 }],
            label: Label { x: 50.0, y: 55.0, size: 14.0 },
        },
        // decal with a diamond accent
        ProfileId::Vinyl => Layout {
            width: 140,
            height: 70,
            cut_color: "#2D2D2D",
            outline: &[Shape::Rect { x: 5.0, y: 5.0, w: 130.0, h: 60.0, rx: 8.0 }],
            guides: &[Shape::Path("M20 35 L28 27 L36 35 L28 43 Z")],
            label: Label { x: 80.0, y: 40.0, size: 16.0 },
        },
        // name plate with a pocket
        ProfileId::Mill => Layout {
            width: 150,
            height: 50,
            cut_color: "#2D2D2D",
            outline: &[Shape::Rect { x: 2.0, y: 2.0, w: 146.0, h: 46.0, rx: 2.0 }],
            guides: &[Shape::Rect { x: 8.0, y: 8.0, w: 134.0, h: 34.0, rx: 1.0 }],
            label: Label { x: 75.0, y: 30.0, size: 14.0 },
        },
        // chamfered sign with hanging holes
        ProfileId::CncRouter => Layout {
            width: 200,
            height: 80,
            cut_color: "#FF0000",
            outline: &[Shape::Path("M10 0 H190 L200 10 V70 L190 80 H10 L0 70 V10 Z")],
            guides: &[
                Shape::Circle { cx: 20.0, cy: 40.0, r: 4.0 },
                Shape::Circle { cx: 180.0, cy: 40.0, r: 4.0 },
            ],
            label: Label { x: 100.0, y: 47.0, size: 20.0 },
        },
    }
}

fn render_document(profile: ProfileId, layout: &Layout, label: &str) -> String {
    let mut doc = String::new();
    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    doc.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}mm\" height=\"{h}mm\" viewBox=\"0 0 {w} {h}\">\n",
        w = layout.width,
        h = layout.height
    ));
    doc.push_str(&format!("  <!-- filegen:{} -->\n", profile));

    for (id, color, shapes) in [
        ("cut", layout.cut_color, layout.outline),
        ("guides", GUIDE_COLOR, layout.guides),
    ] {
        doc.push_str(&format!(
            "  <g id=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\">\n",
            id, color, HAIRLINE
        ));
        for shape in shapes {
            doc.push_str("    ");
            doc.push_str(&shape.to_svg());
            doc.push('\n');
        }
        doc.push_str("  </g>\n");
    }

    doc.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"{}\" text-anchor=\"middle\">{}</text>\n",
        layout.label.x, layout.label.y, layout.label.size, label
    ));
    doc.push_str("</svg>\n");
    doc
}

/// Render the artifact for an already-resolved profile.
pub fn render(profile: ProfileId, literal_text: &str) -> SynthesizedArtifact {
    let has_text = !literal_text.trim().is_empty();
    let label = if has_text { literal_text } else { DEFAULT_LABEL };
    let stem = if has_text { literal_text } else { DEFAULT_FILE_STEM };

    let text_content = render_document(profile, &layout_for(profile), label);
    let content_hash = sha256_hex(text_content.as_bytes());

    SynthesizedArtifact {
        profile,
        suggested_file_name: format!("{}-{}.svg", stem, profile),
        media_type: SVG_MEDIA_TYPE.to_string(),
        content_hash,
        text_content,
    }
}

/// Render the artifact for a raw profile id; unknown ids use the laser layout.
pub fn synthesize(profile_id: &str, literal_text: &str) -> SynthesizedArtifact {
    render(ProfileId::resolve(profile_id), literal_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laser_with_text() {
        let artifact = synthesize("laser", "AVA");
        assert_eq!(artifact.profile, ProfileId::Laser);
        assert_eq!(artifact.suggested_file_name, "AVA-laser.svg");
        assert!(artifact.text_content.contains(">AVA</text>"));
        assert!(artifact.text_content.contains("<circle cx=\"50\" cy=\"50\" r=\"45\"/>"));
    }

    #[test]
    fn test_empty_text_uses_defaults() {
        let artifact = synthesize("vinyl", "");
        assert!(artifact.text_content.contains(">DEMO</text>"));
        assert_eq!(artifact.suggested_file_name, "design-vinyl.svg");

        let blank = synthesize("vinyl", "   ");
        assert_eq!(blank.suggested_file_name, "design-vinyl.svg");
    }

    #[test]
    fn test_unknown_profile_falls_back_to_laser() {
        let artifact = synthesize("plasma", "X");
        assert_eq!(artifact.profile, ProfileId::Laser);
        assert_eq!(artifact.text_content, render(ProfileId::Laser, "X").text_content);
        assert_eq!(artifact.suggested_file_name, "X-laser.svg");
    }

    #[test]
    fn test_every_profile_renders_distinct_document() {
        let docs: Vec<_> = ProfileId::ALL
            .iter()
            .map(|id| render(*id, "NAME").text_content)
            .collect();
        for (i, doc) in docs.iter().enumerate() {
            assert!(doc.starts_with("<?xml"));
            assert!(doc.trim_end().ends_with("</svg>"));
            assert!(doc.contains(">NAME</text>"));
            for other in &docs[i + 1..] {
                assert_ne!(doc, other);
            }
        }
    }

    #[test]
    fn test_no_truncation_at_this_layer() {
        let long = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let artifact = synthesize("mill", long);
        assert!(artifact.text_content.contains(long));
        assert_eq!(artifact.suggested_file_name, format!("{}-mill.svg", long));
    }

    #[test]
    fn test_content_hash_matches_bytes() {
        let artifact = synthesize("cnc", "SHOP");
        assert_eq!(artifact.content_hash, sha256_hex(artifact.bytes()));
        assert_eq!(artifact.media_type, "image/svg+xml");
    }

    #[test]
    fn test_three_d_dimensions() {
        let doc = synthesize("3d", "A").text_content;
        assert!(doc.contains("width=\"120mm\" height=\"60mm\" viewBox=\"0 0 120 60\""));
        assert!(doc.contains("<!-- filegen:3d -->"));
    }
}
