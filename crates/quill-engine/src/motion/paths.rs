// motion/paths.rs
//
// Serpentine lane geometry and constant-speed tile traversal.
//
// A stanza's word tiles drift along two fixed polyline lanes that zig-zag
// down the screen. Construction bakes the lane waypoints and a start offset
// per tile; queries map (tile index, elapsed ms) to a screen position by
// arc-length walking, so motion is a pure function of time.

use glam::Vec2;
use log::debug;

use crate::text::measure::TileMeasure;

/// Number of lanes. Tiles alternate: `tile_idx % 2` picks the lane.
pub const LANES: usize = 2;

/// Gap kept between the facing edges of same-lane neighbors at layout time.
const TILE_PAD: f32 = 60.0;

/// How far past the screen edge a lane enters and exits.
const OFFSCREEN_PAD: f32 = 10.0;

/// How many row heights the playfield is divided into.
const ROW_DIVISIONS: f32 = 11.0;

/// Screen metrics the lanes are built from, fixed for one stanza.
#[derive(Debug, Clone, Copy)]
pub struct PathLayout {
    pub screen_w: f32,
    pub screen_h: f32,
    pub top_margin: f32,
    /// Usually the player entity's height.
    pub bottom_margin: f32,
}

/// Tile speed for the given 1-based stanza number: each stanza is 10%
/// faster than the one before it.
pub fn stanza_speed(base: f32, stanza_number: u32) -> f32 {
    base * 1.1_f32.powi(stanza_number.saturating_sub(1) as i32)
}

/// Lane geometry and per-tile start offsets for one stanza.
pub struct WordPaths {
    /// Pixels per second along the lane polyline.
    speed: f32,
    paths: [Vec<Vec2>; LANES],
    /// Center-to-top-left conversion per tile.
    tile_offsets: Vec<Vec2>,
    tile_widths: Vec<f32>,
    /// Signed arc-length position of each tile at elapsed time zero.
    /// Negative values queue the tile up behind the lane entry.
    tile_start: Vec<f32>,
}

impl WordPaths {
    /// Build lanes for tiles of the given rendered sizes.
    pub fn new(tile_sizes: &[Vec2], layout: &PathLayout, speed: f32) -> Self {
        let mut tile_offsets = Vec::with_capacity(tile_sizes.len());
        let mut tile_widths = Vec::with_capacity(tile_sizes.len());
        let mut widest: f32 = 0.0;
        for size in tile_sizes {
            tile_offsets.push(-*size * 0.5);
            tile_widths.push(size.x);
            widest = widest.max(size.x);
        }

        let row_skip = (layout.screen_h - layout.top_margin - layout.bottom_margin) / ROW_DIVISIONS;
        let top_path_y = layout.top_margin + row_skip / 2.0;
        let paths = [
            build_lane(0, layout.screen_w, widest, row_skip, top_path_y),
            build_lane(1, layout.screen_w, widest, row_skip, top_path_y),
        ];
        let tile_start = initial_tile_starts(&tile_widths);

        debug!(
            "word paths: {} tiles, speed {:.1} px/s, lane lengths {:.0}/{:.0}",
            tile_sizes.len(),
            speed,
            polyline_len(&paths[0]),
            polyline_len(&paths[1]),
        );

        Self {
            speed,
            paths,
            tile_offsets,
            tile_widths,
            tile_start,
        }
    }

    /// Measure each tile through the host's text metrics, then build.
    pub fn for_tiles(
        tiles: &[String],
        measure: &dyn TileMeasure,
        layout: &PathLayout,
        speed: f32,
    ) -> Self {
        let sizes: Vec<Vec2> = tiles.iter().map(|t| measure.measure(t)).collect();
        Self::new(&sizes, layout, speed)
    }

    pub fn tile_count(&self) -> usize {
        self.tile_start.len()
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn lane_of(tile_idx: usize) -> usize {
        tile_idx % LANES
    }

    /// The lane polyline, mostly useful for debug overlays.
    pub fn lane(&self, lane: usize) -> &[Vec2] {
        &self.paths[lane]
    }

    /// Total arc length of a lane.
    pub fn lane_len(&self, lane: usize) -> f32 {
        polyline_len(&self.paths[lane])
    }

    /// Width of one tile as measured at construction.
    pub fn tile_width(&self, tile_idx: usize) -> f32 {
        self.tile_widths[tile_idx]
    }

    /// Arc-length start offset of one tile (negative = queued offscreen).
    pub fn tile_start(&self, tile_idx: usize) -> f32 {
        self.tile_start[tile_idx]
    }

    /// Top-left position of a tile at `elapsed_ms` since construction,
    /// plus whether the tile has reached the end of its lane. The done
    /// flag is monotonic in time.
    ///
    /// Panics if `tile_idx` was not part of the constructed stanza.
    pub fn tile_pos(&self, tile_idx: usize, elapsed_ms: u64) -> (Vec2, bool) {
        assert!(
            tile_idx < self.tile_start.len(),
            "tile_pos: index {} out of range for {} tiles",
            tile_idx,
            self.tile_start.len()
        );

        // Clamped at zero: a deeply queued tile waits at the lane entry
        // (which sits offscreen) until its time comes.
        let pos = (self.tile_start[tile_idx] + elapsed_ms as f32 / 1000.0 * self.speed).max(0.0);

        let path = &self.paths[Self::lane_of(tile_idx)];
        let offset = self.tile_offsets[tile_idx];
        let mut travelled = 0.0;
        let mut from = path[0];
        for &to in &path[1..] {
            let seg = from.distance(to);
            if travelled + seg > pos {
                let frac = (pos - travelled) / seg;
                return (from + (to - from) * frac + offset, false);
            }
            travelled += seg;
            from = to;
        }
        // Ran off the end of the lane.
        (from + offset, true)
    }
}

/// Lay same-lane tiles out nose-to-tail behind the lane entry, earliest
/// reading-order tile closest to visible. Two cursors run independently,
/// one per lane.
fn initial_tile_starts(tile_widths: &[f32]) -> Vec<f32> {
    let mut starts = Vec::with_capacity(tile_widths.len());
    let mut cursor = [0.0f32; LANES];
    let mut prev_w = [0.0f32; LANES];
    for (i, &width) in tile_widths.iter().enumerate() {
        let lane = i % LANES;
        let s = cursor[lane] - (prev_w[lane] + width) / 2.0 - TILE_PAD;
        starts.push(s);
        cursor[lane] = s;
        prev_w[lane] = width;
    }
    starts
}

/// Build one lane's waypoints: three sweeps across the screen joined by
/// `row_skip` drops at the far edge and `3 * row_skip` drops between
/// sweeps.
///
/// Lane 0 runs left-to-right; from its second sweep on, the rightward
/// turnaround is pulled in by the widest tile's width so returning tiles
/// clear offscreen tiles still entering. Lane 1 is the horizontal mirror,
/// enters two rows lower, widens its leftward turnaround on the first two
/// turns, and bows out early on its third sweep: it jumps straight
/// offscreen-left instead of completing a final drop-and-return. The two
/// lanes are deliberately not symmetric.
fn build_lane(lane: usize, screen_w: f32, widest: f32, row_skip: f32, top_path_y: f32) -> Vec<Vec2> {
    let half = widest / 2.0;
    let off_left = -half - OFFSCREEN_PAD;

    let enter_x = if lane == 0 {
        off_left
    } else {
        screen_w + half + OFFSCREEN_PAD
    };
    let far_x = |turn: usize| -> f32 {
        if lane == 0 {
            if turn > 0 {
                screen_w - half - widest
            } else {
                screen_w - half
            }
        } else if turn < 2 {
            half + widest
        } else {
            half
        }
    };
    let near_x = if lane == 0 { half } else { screen_w - half };

    let mut path = Vec::with_capacity(12);
    let mut x = enter_x;
    let mut y = top_path_y + 2.0 * row_skip * lane as f32;
    for turn in 0..3 {
        path.push(Vec2::new(x, y));

        if lane == 1 && turn == 2 {
            path.push(Vec2::new(off_left, y));
            break;
        }

        x = far_x(turn);
        path.push(Vec2::new(x, y));
        y += row_skip;
        path.push(Vec2::new(x, y));
        x = if turn < 2 { near_x } else { off_left };
        path.push(Vec2::new(x, y));
        y += 3.0 * row_skip;
    }
    path
}

fn polyline_len(path: &[Vec2]) -> f32 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}
