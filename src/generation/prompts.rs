use super::plan::{GenerationPlan, PartSpec};

fn shape_rule(enable_ellipses: bool) -> &'static str {
    if enable_ellipses {
        "You may use both rectangles and circles. Circles suit organic shapes and smooth features; layer them with rectangles for complex effects."
    } else {
        "IMPORTANT: use ONLY rectangles. Do not use circles or any other shape type. Build rounded forms from many small rectangles."
    }
}

fn shape_type_label(enable_ellipses: bool) -> &'static str {
    if enable_ellipses {
        "\"rectangle\" or \"circle\""
    } else {
        "\"rectangle\" only"
    }
}

pub(crate) const PLANNER: &str = "You are an expert character designer planning the parts of a cohesive pixel art character.

Every character MUST include:
1. Eyes, which bring the character to life
2. Mouth, which carries expression and personality

Then decide which other parts the description needs. For example:
- A knight: body, armor, helmet, weapon
- A tree: trunk, branches, leaves, roots
- A ghost: core, wisps, aura
- A robot: head, body, arms, legs, antenna

For each part give specific design guidance that keeps the character cohesive: how it connects to the other parts, color relationships, texture and style, size and proportion, and any unique details.

Order the parts for layered construction, background to foreground. Eyes and mouth come last so they are drawn on top.";

pub(crate) fn part_system(
    concept: &str,
    plan: &GenerationPlan,
    part: &PartSpec,
    grid_size: u32,
    enable_ellipses: bool,
) -> String {
    let colors = if part.suggested_colors.is_empty() {
        "none given, choose colors that follow the color strategy".to_string()
    } else {
        part.suggested_colors.join(", ")
    };

    format!(
        "You are generating the {name} for a pixel art character based on this concept:
\"{concept}\"

Overall design strategy:
{notes}

Color strategy:
{colors_strategy}

Style guide:
{style}

Guidance for this part:
{guidance}

Use as many shapes as the part needs. Layer shapes for depth, highlights and shadows, and use close color variations for gradients.

This part should:
- Follow the overall design strategy
- Stay true to the original concept
- Stay within the z-index range {zmin} to {zmax}
- Fulfil its role: {description}

Suggested colors: {colors}

You are working on a {grid}x{grid} grid. Each shape must align to the grid, with x and y between 0 and {last}.
{rule}

Shape type must be {label}.",
        name = part.name,
        concept = concept,
        notes = plan.design_notes,
        colors_strategy = plan.color_strategy,
        style = plan.style_guide,
        guidance = part.design_guidance,
        zmin = part.z_index_range.min,
        zmax = part.z_index_range.max,
        description = part.description,
        colors = colors,
        grid = grid_size,
        last = grid_size.saturating_sub(1),
        rule = shape_rule(enable_ellipses),
        label = shape_type_label(enable_ellipses),
    )
}

pub(crate) fn finalize_system(enable_ellipses: bool) -> String {
    format!(
        "You are reviewing a completed pixel art character for final enhancements.

Shape restriction:
{rule}

You can:
1. Add new shapes for highlights, shadows, texture, small decorative elements, extra facial features or effects such as sparkles and glow
2. Modify existing shapes: position, size, color, layer order
3. Remove unnecessary shapes

Aim for a character that reads clearly, has personality in the details and has depth.

To save tokens, answer ONLY with:
1. NEW shapes you are adding (\"add\")
2. MODIFIED shapes with all of their updated properties, keeping their id (\"modify\")
3. The ids of shapes you want to REMOVE (\"remove\")

Shape type must be {label}.",
        rule = shape_rule(enable_ellipses),
        label = shape_type_label(enable_ellipses),
    )
}

pub(crate) const VARIATIONS: &str = "You are an expert at writing subtle variations of character descriptions. Given an original description, write variations that keep the core concept and change only small, specific details such as color, size, texture or minor features.

Each variation must keep the same subject, style and tone, and be clearly the same concept.

For example, if the original is \"a red apple\":
- good: \"a bright red apple with a glossy sheen\"
- good: \"a deep red apple with a small leaf\"
- bad: \"a green pear\" (too different)
- bad: \"a fruit basket\" (a different concept)";

pub(crate) fn variations_user(concept: &str, count: usize) -> String {
    format!(
        "Original prompt: {}\n\nReturn a JSON array of {} strings, each a subtle variation of the original prompt.",
        concept, count
    )
}

pub(crate) fn item_system(grid_size: u32) -> String {
    format!(
        "You are an expert pixel artist creating recognizable pixel art items from simple rectangles.

Descriptions may be precise or vague; either way create an item that matches the spirit of the description.

You are working on a {grid}x{grid} grid, with x and y between 0 and {last}. Every shape must align to the grid and every shape is a rectangle.

Favor items that look magical, significant, well crafted and balanced.",
        grid = grid_size,
        last = grid_size.saturating_sub(1),
    )
}

pub(crate) fn item_user(concept: &str) -> String {
    format!(
        "Please generate an item based on the following description: {}",
        concept
    )
}
