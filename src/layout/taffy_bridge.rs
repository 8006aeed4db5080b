//! Taffy Bridge - Lays out the connected document with Taffy.
//!
//! Mirrors the tree under `body` into a `TaffyTree`, runs flexbox layout
//! against the viewport width and writes absolute rectangles back into the
//! document, where the viewport detector reads them.

use taffy::{
    AlignItems, AvailableSpace, Dimension, Display, FlexDirection, NodeId as TaffyNodeId, Point,
    Rect, Size, Style, TaffyError, TaffyTree,
};

use crate::dom::{Document, NodeId};

// =============================================================================
// STYLE BUILDING
// =============================================================================

/// Parse a numeric `width`/`height` attribute ("120" or "120px").
fn attribute_length(doc: &Document, node: NodeId, name: &str) -> Option<f32> {
    let value = doc.get_attribute(node, name)?;
    value.trim().trim_end_matches("px").parse::<f32>().ok()
}

fn to_dimension(length: Option<f32>) -> Dimension {
    match length {
        Some(n) => Dimension::Length(n),
        None => Dimension::Auto,
    }
}

/// Build the style of the root container.
fn root_style(viewport: Size<f32>) -> Style {
    Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        align_items: Some(AlignItems::FlexStart),
        size: Size {
            width: Dimension::Length(viewport.width),
            height: Dimension::Auto,
        },
        ..Default::default()
    }
}

/// Build the style of an element.
///
/// An explicit box size wins over `width`/`height` attributes. Elements
/// without either size to their content.
fn element_style(doc: &Document, node: NodeId) -> Style {
    let (width, height) = match doc.box_size(node) {
        Some(size) => (Some(size.width), Some(size.height)),
        None => (
            attribute_length(doc, node, "width"),
            attribute_length(doc, node, "height"),
        ),
    };

    Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Row,
        flex_shrink: 0.0,
        size: Size {
            width: to_dimension(width),
            height: to_dimension(height),
        },
        ..Default::default()
    }
}

// =============================================================================
// TREE MIRRORING
// =============================================================================

fn build_node(
    doc: &Document,
    tree: &mut TaffyTree<()>,
    node: NodeId,
    style: Style,
) -> Result<TaffyNodeId, TaffyError> {
    let mut children = Vec::new();
    for child in doc.children(node) {
        let child_style = element_style(doc, child);
        children.push(build_node(doc, tree, child, child_style)?);
    }
    tree.new_with_children(style, &children)
}

fn write_back(
    doc: &Document,
    tree: &TaffyTree<()>,
    node: NodeId,
    taffy_node: TaffyNodeId,
    origin: Point<f32>,
) -> Result<(), TaffyError> {
    let layout = tree.layout(taffy_node)?;
    let left = origin.x + layout.location.x;
    let top = origin.y + layout.location.y;
    doc.set_layout(
        node,
        Rect {
            left,
            right: left + layout.size.width,
            top,
            bottom: top + layout.size.height,
        },
    );

    // Children were mirrored in document order
    let taffy_children = tree.children(taffy_node)?;
    for (child, taffy_child) in doc.children(node).into_iter().zip(taffy_children) {
        write_back(doc, tree, child, taffy_child, Point { x: left, y: top })?;
    }
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Compute layout for every connected node.
///
/// Detached nodes (free clones, unmounted placeholders) keep their previous
/// rectangles.
pub fn compute_layout(doc: &Document) -> Result<(), TaffyError> {
    let viewport = doc.viewport();
    let body = doc.body();

    let mut tree: TaffyTree<()> = TaffyTree::new();
    let root = build_node(doc, &mut tree, body, root_style(viewport))?;

    let available = Size {
        width: AvailableSpace::Definite(viewport.width),
        height: AvailableSpace::MaxContent,
    };
    tree.compute_layout(root, available)?;

    write_back(doc, &tree, body, root, Point { x: 0.0, y: 0.0 })
}
