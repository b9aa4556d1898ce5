//! Circular ligand -> receptor diagram. Layout is computed in degrees
//! clockwise from twelve o'clock and then drawn as polygons.

use std::collections::BTreeMap;
use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::model::links::{AnnotatedLink, UNASSIGNED_CATEGORY};
use crate::render::palette::{UNASSIGNED_COLOR, category_color};
use crate::render::{RenderError, draw_error};

pub const SMALL_GAP_DEG: f64 = 1.0;
pub const BIG_GAP_DEG: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Side {
    Ligand,
    Receptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub name: String,
    pub category: String,
    pub side: Side,
    pub start_deg: f64,
    pub end_deg: f64,
    pub color: RGBColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ribbon {
    pub ligand: String,
    pub receptor: String,
    pub weight: f64,
    pub ligand_span: (f64, f64),
    pub receptor_span: (f64, f64),
    /// 0 is opaque, 1 fully transparent.
    pub transparency: f64,
    pub visible: bool,
    pub color: RGBColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChordLayout {
    pub sectors: Vec<Sector>,
    pub ribbons: Vec<Ribbon>,
    pub cutoff: f64,
    pub legend: Vec<(String, RGBColor)>,
}

/// Smallest per-ligand maximum weight, so every ligand keeps its strongest link.
pub fn default_link_cutoff(links: &[AnnotatedLink]) -> f64 {
    let mut best: BTreeMap<&str, f64> = BTreeMap::new();
    for link in links {
        let entry = best.entry(link.ligand.as_str()).or_insert(f64::NEG_INFINITY);
        *entry = entry.max(link.weight);
    }
    if best.is_empty() {
        return 0.0;
    }
    best.values().copied().fold(f64::INFINITY, f64::min)
}

/// 1 - min-max normalized weight; all-equal weights are fully opaque.
pub fn link_transparency(weights: &[f64]) -> Vec<f64> {
    let min = weights.iter().copied().fold(f64::INFINITY, f64::min);
    let max = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    weights
        .iter()
        .map(|&w| if span > 0.0 { 1.0 - (w - min) / span } else { 0.0 })
        .collect()
}

/// Categories sorted by name with `unassigned` last.
fn category_order<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut cats: Vec<String> = names
        .filter(|c| *c != UNASSIGNED_CATEGORY)
        .map(str::to_string)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    cats.push(UNASSIGNED_CATEGORY.to_string());
    cats
}

/// Sector members of one side as (name, category), grouped by category.
fn side_members(pairs: impl Iterator<Item = (String, String)>) -> Vec<(String, String)> {
    let mut first: BTreeMap<String, String> = BTreeMap::new();
    for (name, category) in pairs {
        first.entry(name).or_insert(category);
    }
    let order = category_order(first.values().map(|c| c.as_str()));
    let mut members: Vec<(String, String)> = first.into_iter().collect();
    members.sort_by_key(|(name, cat)| {
        (
            order.iter().position(|c| c == cat).unwrap_or(order.len()),
            name.clone(),
        )
    });
    members
}

/// Places ligand sectors, then receptor sectors, around the circle. Sector
/// arcs are proportional to summed link weight. Gaps are small between
/// sectors of one category and wide between categories and between the two
/// halves. Links below `cutoff` (default: [`default_link_cutoff`]) are kept in
/// the layout but marked invisible.
pub fn chord_layout(links: &[AnnotatedLink], cutoff: Option<f64>) -> ChordLayout {
    let cutoff = cutoff.unwrap_or_else(|| default_link_cutoff(links));
    let ligands = side_members(
        links
            .iter()
            .map(|l| (l.ligand.clone(), l.ligand_type.clone())),
    );
    let receptors = side_members(
        links
            .iter()
            .map(|l| (l.receptor.clone(), l.receptor_type.clone())),
    );

    let mut legend: Vec<(String, RGBColor)> = Vec::new();
    let mut color_of = |category: &str| -> RGBColor {
        if category == UNASSIGNED_CATEGORY {
            return UNASSIGNED_COLOR;
        }
        if let Some((_, c)) = legend.iter().find(|(name, _)| name == category) {
            return *c;
        }
        let c = category_color(legend.len());
        legend.push((category.to_string(), c));
        c
    };

    let all_zero = links.iter().all(|l| l.weight <= 0.0);
    let size = |l: &AnnotatedLink| if all_zero { 1.0 } else { l.weight.max(0.0) };

    let mut sectors: Vec<Sector> = Vec::with_capacity(ligands.len() + receptors.len());
    let mut totals: Vec<f64> = Vec::with_capacity(ligands.len() + receptors.len());
    for (side, members) in [(Side::Ligand, &ligands), (Side::Receptor, &receptors)] {
        for (name, category) in members {
            let total: f64 = links
                .iter()
                .filter(|l| match side {
                    Side::Ligand => &l.ligand == name,
                    Side::Receptor => &l.receptor == name,
                })
                .map(size)
                .sum();
            totals.push(total);
            sectors.push(Sector {
                name: name.clone(),
                category: category.clone(),
                side,
                start_deg: 0.0,
                end_deg: 0.0,
                color: color_of(category),
            });
        }
    }
    if sectors.is_empty() {
        return ChordLayout {
            sectors,
            ribbons: Vec::new(),
            cutoff,
            legend,
        };
    }

    let n = sectors.len();
    let mut gaps: Vec<f64> = (0..n)
        .map(|i| {
            let next = &sectors[(i + 1) % n];
            let cur = &sectors[i];
            if cur.side != next.side || i + 1 == n || cur.category != next.category {
                BIG_GAP_DEG
            } else {
                SMALL_GAP_DEG
            }
        })
        .collect();
    let mut gap_total: f64 = gaps.iter().sum();
    if gap_total > 180.0 {
        let shrink = 180.0 / gap_total;
        gaps.iter_mut().for_each(|g| *g *= shrink);
        gap_total = 180.0;
    }
    let weight_total: f64 = totals.iter().sum();
    let unit = if weight_total > 0.0 {
        (360.0 - gap_total) / weight_total
    } else {
        0.0
    };

    let mut cursor = 0.0;
    for (i, sector) in sectors.iter_mut().enumerate() {
        sector.start_deg = cursor;
        sector.end_deg = cursor + totals[i] * unit;
        cursor = sector.end_deg + gaps[i];
    }

    let index: BTreeMap<(Side, &str), usize> = sectors
        .iter()
        .enumerate()
        .map(|(i, s)| ((s.side, s.name.as_str()), i))
        .collect();
    let sector_pos = |side: Side, name: &str| index.get(&(side, name)).copied().unwrap_or(0);

    // Ligand arcs fill in receptor order; receptor arcs fill in ligand order.
    let mut by_ligand: Vec<usize> = (0..links.len()).collect();
    by_ligand.sort_by_key(|&i| sector_pos(Side::Receptor, &links[i].receptor));
    let mut by_receptor: Vec<usize> = (0..links.len()).collect();
    by_receptor.sort_by_key(|&i| sector_pos(Side::Ligand, &links[i].ligand));

    let mut fill: Vec<f64> = sectors.iter().map(|s| s.start_deg).collect();
    let mut ligand_spans = vec![(0.0, 0.0); links.len()];
    for &i in &by_ligand {
        let s = sector_pos(Side::Ligand, &links[i].ligand);
        let width = size(&links[i]) * unit;
        ligand_spans[i] = (fill[s], fill[s] + width);
        fill[s] += width;
    }
    let mut receptor_spans = vec![(0.0, 0.0); links.len()];
    for &i in &by_receptor {
        let s = sector_pos(Side::Receptor, &links[i].receptor);
        let width = size(&links[i]) * unit;
        receptor_spans[i] = (fill[s], fill[s] + width);
        fill[s] += width;
    }

    let weights: Vec<f64> = links.iter().map(|l| l.weight).collect();
    let transparency = link_transparency(&weights);
    let ribbons = links
        .iter()
        .enumerate()
        .map(|(i, l)| Ribbon {
            ligand: l.ligand.clone(),
            receptor: l.receptor.clone(),
            weight: l.weight,
            ligand_span: ligand_spans[i],
            receptor_span: receptor_spans[i],
            transparency: transparency[i],
            visible: l.weight >= cutoff,
            color: sectors[sector_pos(Side::Ligand, &l.ligand)].color,
        })
        .collect();

    ChordLayout {
        sectors,
        ribbons,
        cutoff,
        legend,
    }
}

fn polar(center: (f64, f64), radius: f64, deg: f64) -> (f64, f64) {
    let theta = (deg - 90.0).to_radians();
    (center.0 + radius * theta.cos(), center.1 + radius * theta.sin())
}

fn arc(center: (f64, f64), radius: f64, from: f64, to: f64) -> Vec<(i32, i32)> {
    let steps = (((to - from).abs() / 2.0).ceil() as usize).max(2);
    (0..=steps)
        .map(|k| {
            let (x, y) = polar(center, radius, from + (to - from) * k as f64 / steps as f64);
            (x.round() as i32, y.round() as i32)
        })
        .collect()
}

/// Quadratic Bezier from `a` to `b` bent through `control`.
fn bezier(a: (f64, f64), control: (f64, f64), b: (f64, f64)) -> Vec<(i32, i32)> {
    (1..20)
        .map(|k| {
            let t = k as f64 / 20.0;
            let u = 1.0 - t;
            let x = u * u * a.0 + 2.0 * u * t * control.0 + t * t * b.0;
            let y = u * u * a.1 + 2.0 * u * t * control.1 + t * t * b.1;
            (x.round() as i32, y.round() as i32)
        })
        .collect()
}

pub fn render_chord(path: &Path, layout: &ChordLayout, size: u32) -> Result<(), RenderError> {
    if layout.sectors.is_empty() {
        return Err(RenderError::Empty("chord diagram".to_string()));
    }
    let err = draw_error(path);
    let root = SVGBackend::new(path, (size, size)).into_drawing_area();
    root.fill(&WHITE).map_err(&err)?;

    let s = size as f64;
    let center = (s / 2.0, s / 2.0);
    let radius = s * 0.32;
    let track = s * 0.03;

    for ribbon in layout.ribbons.iter().filter(|r| r.visible) {
        let (a0, a1) = ribbon.ligand_span;
        let (b0, b1) = ribbon.receptor_span;
        let mut points = arc(center, radius, a0, a1);
        points.extend(bezier(polar(center, radius, a1), center, polar(center, radius, b0)));
        points.extend(arc(center, radius, b0, b1));
        points.extend(bezier(polar(center, radius, b1), center, polar(center, radius, a0)));
        root.draw(&Polygon::new(
            points,
            ribbon.color.mix(1.0 - ribbon.transparency).filled(),
        ))
        .map_err(&err)?;
    }

    let label_font = ("sans-serif", 13.0).into_font().color(&BLACK);
    for sector in &layout.sectors {
        let mut band = arc(center, radius + track, sector.start_deg, sector.end_deg);
        band.extend(arc(center, radius + 2.0, sector.end_deg, sector.start_deg));
        root.draw(&Polygon::new(band, sector.color.filled()))
            .map_err(&err)?;

        let mid = (sector.start_deg + sector.end_deg) / 2.0;
        let (x, y) = polar(center, radius + track + 8.0, mid);
        let hpos = if mid < 180.0 { HPos::Left } else { HPos::Right };
        root.draw(&Text::new(
            sector.name.clone(),
            (x.round() as i32, y.round() as i32),
            label_font.clone().pos(Pos::new(hpos, VPos::Center)),
        ))
        .map_err(&err)?;
    }

    let legend_font = ("sans-serif", 12.0).into_font().color(&BLACK);
    let mut entries = layout.legend.clone();
    if layout
        .sectors
        .iter()
        .any(|sec| sec.category == UNASSIGNED_CATEGORY)
    {
        entries.push((UNASSIGNED_CATEGORY.to_string(), UNASSIGNED_COLOR));
    }
    for (i, (name, color)) in entries.iter().enumerate() {
        let y = 20 + i as i32 * 18;
        root.draw(&Rectangle::new([(16, y), (28, y + 12)], color.filled()))
            .map_err(&err)?;
        root.draw(&Text::new(name.clone(), (34, y), legend_font.clone()))
            .map_err(&err)?;
    }

    root.present().map_err(&err)?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/render/chord.rs"]
mod tests;
