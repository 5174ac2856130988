//! Reader for OpenCV cascade classifier XML (the format written by
//! `opencv_traincascade` and shipped as `haarcascade_*.xml`).
//!
//! Only boosted Haar cascades with upright features are accepted. Legacy
//! `opencv-haar-classifier` files, LBP/HOG cascades and tilted features are
//! reported as [`CascadeError::Unsupported`].
use std::str::FromStr;

use roxmltree::{Document, Node};

use crate::detection::infrastructure::haar_cascade::{
    CascadeError, HaarCascade, HaarFeature, HaarRect, Stage, TreeNode, WeakClassifier,
};

const LEGACY_TYPE_ID: &str = "opencv-haar-classifier";

/// Parses a cascade document and validates the resulting model.
pub fn parse(xml: &str) -> Result<HaarCascade, CascadeError> {
    let doc = Document::parse(xml)?;
    let storage = doc.root_element();

    let Some(cascade) = elements(storage, "cascade").next() else {
        let legacy = storage
            .children()
            .any(|n| n.is_element() && n.attribute("type_id") == Some(LEGACY_TYPE_ID));
        return Err(if legacy {
            CascadeError::Unsupported("legacy opencv-haar-classifier format".into())
        } else {
            CascadeError::MissingElement("cascade".into())
        });
    };

    let stage_type = text(child(cascade, "stageType")?);
    if stage_type != "BOOST" {
        return Err(CascadeError::Unsupported(format!("stage type {stage_type}")));
    }
    let feature_type = text(child(cascade, "featureType")?);
    if feature_type != "HAAR" {
        return Err(CascadeError::Unsupported(format!("feature type {feature_type}")));
    }

    let width: u32 = number(child(cascade, "width")?)?;
    let height: u32 = number(child(cascade, "height")?)?;

    let stages = elements(child(cascade, "stages")?, "_")
        .map(parse_stage)
        .collect::<Result<Vec<_>, _>>()?;
    let features = elements(child(cascade, "features")?, "_")
        .map(parse_feature)
        .collect::<Result<Vec<_>, _>>()?;

    HaarCascade::new(width, height, stages, features)
}

// Thresholds and leaf values are single precision in OpenCV; they are read
// as `f32` so a window near a boundary is decided the same way.

fn parse_stage(node: Node<'_, '_>) -> Result<Stage, CascadeError> {
    let threshold = f64::from(number::<f32>(child(node, "stageThreshold")?)?);
    let classifiers = elements(child(node, "weakClassifiers")?, "_")
        .map(parse_weak_classifier)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage {
        threshold,
        classifiers,
    })
}

fn parse_weak_classifier(node: Node<'_, '_>) -> Result<WeakClassifier, CascadeError> {
    let internal = child(node, "internalNodes")?;
    let fields: Vec<&str> = text(internal).split_whitespace().collect();
    if fields.is_empty() || fields.len() % 4 != 0 {
        return Err(CascadeError::Invalid(format!(
            "internalNodes holds {} values, expected groups of 4",
            fields.len()
        )));
    }
    let nodes = fields
        .chunks_exact(4)
        .map(|f| {
            Ok(TreeNode {
                left: parse_field("internalNodes", f[0])?,
                right: parse_field("internalNodes", f[1])?,
                feature: parse_field("internalNodes", f[2])?,
                threshold: f64::from(parse_field::<f32>("internalNodes", f[3])?),
            })
        })
        .collect::<Result<Vec<_>, CascadeError>>()?;
    let leaves = numbers::<f32>(child(node, "leafValues")?)?
        .into_iter()
        .map(f64::from)
        .collect();
    Ok(WeakClassifier { nodes, leaves })
}

fn parse_feature(node: Node<'_, '_>) -> Result<HaarFeature, CascadeError> {
    if let Some(tilted) = elements(node, "tilted").next() {
        if text(tilted) != "0" {
            return Err(CascadeError::Unsupported("tilted Haar features".into()));
        }
    }
    let rects = elements(child(node, "rects")?, "_")
        .map(|r| {
            let fields: Vec<&str> = text(r).split_whitespace().collect();
            if fields.len() != 5 {
                return Err(CascadeError::Invalid(format!(
                    "rect {:?} should be `x y width height weight`",
                    text(r)
                )));
            }
            Ok(HaarRect {
                x: parse_field("rects", fields[0])?,
                y: parse_field("rects", fields[1])?,
                width: parse_field("rects", fields[2])?,
                height: parse_field("rects", fields[3])?,
                weight: parse_field("rects", fields[4])?,
            })
        })
        .collect::<Result<Vec<_>, CascadeError>>()?;
    Ok(HaarFeature { rects })
}

fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.has_tag_name(name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>, CascadeError> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name(name))
        .ok_or_else(|| CascadeError::MissingElement(name.to_string()))
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

fn number<T: FromStr>(node: Node<'_, '_>) -> Result<T, CascadeError> {
    parse_field(node.tag_name().name(), text(node))
}

fn numbers<T: FromStr>(node: Node<'_, '_>) -> Result<Vec<T>, CascadeError> {
    let element = node.tag_name().name();
    text(node)
        .split_whitespace()
        .map(|v| parse_field(element, v))
        .collect()
}

fn parse_field<T: FromStr>(element: &str, value: &str) -> Result<T, CascadeError> {
    value.parse().map_err(|_| CascadeError::InvalidNumber {
        element: element.to_string(),
        value: value.to_string(),
    })
}
