use serde::Serialize;

use crate::util::EPSILON;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TileRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl TileRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width.max(0.0), height.max(0.0))
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub(super) fn inset(&self, amount: f64) -> Self {
        let (mut x0, mut y0) = (self.x0 + amount, self.y0 + amount);
        let (mut x1, mut y1) = (self.x1 - amount, self.y1 - amount);
        if x1 < x0 {
            x0 = (x0 + x1) / 2.0;
            x1 = x0;
        }
        if y1 < y0 {
            y0 = (y0 + y1) / 2.0;
            y1 = y0;
        }
        Self { x0, y0, x1, y1 }
    }

    pub(super) fn rounded(&self) -> Self {
        Self::new(
            self.x0.round(),
            self.y0.round(),
            self.x1.round(),
            self.y1.round(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Row {
    pub(super) len: usize,
    pub(super) dice: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(super) struct RowLayout {
    pub(super) ratio: f64,
    pub(super) rows: Vec<Row>,
}

impl RowLayout {
    pub(super) fn fits(&self, ratio: f64, child_count: usize) -> bool {
        self.ratio == ratio
            && self.rows.iter().all(|row| row.len > 0)
            && self.rows.iter().map(|row| row.len).sum::<usize>() == child_count
    }
}

fn dice(values: &[f64], rect: TileRect, out: &mut Vec<TileRect>) {
    let total: f64 = values.iter().sum();
    let k = if total > 0.0 { rect.width() / total } else { 0.0 };
    let mut x = rect.x0;
    for value in values {
        let next = x + value * k;
        out.push(TileRect::new(x, rect.y0, next, rect.y1));
        x = next;
    }
}

fn slice(values: &[f64], rect: TileRect, out: &mut Vec<TileRect>) {
    let total: f64 = values.iter().sum();
    let k = if total > 0.0 { rect.height() / total } else { 0.0 };
    let mut y = rect.y0;
    for value in values {
        let next = y + value * k;
        out.push(TileRect::new(rect.x0, y, rect.x1, next));
        y = next;
    }
}

fn place_row(
    values: &[f64],
    row_value: f64,
    remaining_value: f64,
    dice_row: bool,
    rect: TileRect,
    out: &mut Vec<TileRect>,
) -> TileRect {
    let share = if remaining_value > 0.0 {
        (row_value / remaining_value).clamp(0.0, 1.0)
    } else {
        1.0
    };

    if dice_row {
        let cut = rect.y0 + rect.height() * share;
        dice(values, TileRect::new(rect.x0, rect.y0, rect.x1, cut), out);
        TileRect::new(rect.x0, cut, rect.x1, rect.y1)
    } else {
        let cut = rect.x0 + rect.width() * share;
        slice(values, TileRect::new(rect.x0, rect.y0, cut, rect.y1), out);
        TileRect::new(cut, rect.y0, rect.x1, rect.y1)
    }
}

pub(super) fn squarify(ratio: f64, values: &[f64], rect: TileRect) -> (Vec<TileRect>, RowLayout) {
    let mut out = Vec::with_capacity(values.len());
    let mut rows = Vec::new();
    let n = values.len();
    let mut remaining_value: f64 = values.iter().sum();
    let mut rest = rect;
    let (mut i0, mut i1) = (0, 0);

    while i0 < n {
        let dx = rest.width().max(EPSILON as f64);
        let dy = rest.height().max(EPSILON as f64);

        // Leading zero values join the row of the first non-zero value.
        let mut sum_value;
        loop {
            sum_value = values[i1];
            i1 += 1;
            if sum_value > 0.0 || i1 >= n {
                break;
            }
        }

        let mut min_value = sum_value;
        let mut max_value = sum_value;
        let alpha = (dy / dx).max(dx / dy) / (remaining_value * ratio).max(f64::MIN_POSITIVE);
        let mut beta = sum_value * sum_value * alpha;
        let mut min_ratio = worst_ratio(min_value, max_value, beta);

        while i1 < n {
            let value = values[i1];
            sum_value += value;
            min_value = min_value.min(value);
            max_value = max_value.max(value);
            beta = sum_value * sum_value * alpha;
            let new_ratio = worst_ratio(min_value, max_value, beta);
            if new_ratio > min_ratio {
                sum_value -= value;
                break;
            }
            min_ratio = new_ratio;
            i1 += 1;
        }

        let dice_row = dx < dy;
        rest = place_row(
            &values[i0..i1],
            sum_value,
            remaining_value,
            dice_row,
            rest,
            &mut out,
        );
        rows.push(Row {
            len: i1 - i0,
            dice: dice_row,
        });
        remaining_value -= sum_value;
        i0 = i1;
    }

    (out, RowLayout { ratio, rows })
}

fn worst_ratio(min_value: f64, max_value: f64, beta: f64) -> f64 {
    if beta <= 0.0 || min_value <= 0.0 {
        return f64::INFINITY;
    }
    (max_value / beta).max(beta / min_value)
}

/// Re-tiles `values` using a remembered row structure: the grouping and
/// orientation of rows are kept, only their extents follow the new values.
pub(super) fn resquarify(layout: &RowLayout, values: &[f64], rect: TileRect) -> Vec<TileRect> {
    let mut out = Vec::with_capacity(values.len());
    let mut remaining_value: f64 = values.iter().sum();
    let mut rest = rect;
    let mut start = 0;

    for row in &layout.rows {
        let end = start + row.len;
        let row_values = &values[start..end];
        let row_value: f64 = row_values.iter().sum();
        rest = place_row(row_values, row_value, remaining_value, row.dice, rest, &mut out);
        remaining_value -= row_value;
        start = end;
    }
    out
}
