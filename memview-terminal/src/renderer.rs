/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use memview_core::projection::project_point;
use memview_core::{Assembly, Transform};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;
use std::ops::Range;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Matrices shared by every component in one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameMatrices {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

/// Converts an assembly into terminal characters, keeping a pick id per cell.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    pick_buffer: Vec<Option<usize>>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            pick_buffer: vec![None; size],
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.pick_buffer.fill(None);
    }

    /// Rasterize every component's faces.
    pub fn render_assembly(&mut self, assembly: &Assembly, frame: &FrameMatrices) {
        let mut first_id = 0;
        for (component, part) in assembly.placed() {
            let model = frame.model * component.matrix;
            let mvp = Transform::mvp_matrix(&model, &frame.view, &frame.projection);

            for triangle in part.face_triangles() {
                // Triangles outside every face boundary are drawn but not pickable.
                let pick_id = triangle.face.map(|face| first_id + face);
                self.render_triangle(&triangle.positions, &model, &mvp, pick_id);
            }
            first_id += part.pick_id_count();
        }
    }

    /// Pick id of the surface drawn at a cell.
    pub fn pick_at(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        self.pick_buffer[y as usize * self.width + x as usize]
    }

    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }

    fn render_triangle(
        &mut self,
        positions: &[Point3<f32>; 3],
        model: &Matrix4<f32>,
        mvp: &Matrix4<f32>,
        pick_id: Option<usize>,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (coord, position) in screen_coords.iter_mut().zip(positions) {
            match project_point(mvp, position, self.width as u32, self.height as u32) {
                Some(projected) => *coord = projected,
                None => return, // Triangle is clipped
            }
        }

        // Two-sided lighting from the camera direction
        let [a, b, c] = (*positions).map(|p| model.transform_point(&p));
        let normal = (b - a).cross(&(c - a));
        if normal.norm_squared() < f32::EPSILON {
            return;
        }
        let light_dir = Vector3::new(0.0, 0.0, -1.0);
        let brightness = normal.normalize().dot(&light_dir).abs();

        // Map brightness to character, never blank so silhouettes stay visible
        let steps = (LUMINOSITY_RAMP.len() - 2) as f32;
        let char_index = 1 + (brightness * steps).round() as usize;
        let character = LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)];

        self.rasterize_triangle(&screen_coords, character, pick_id);
    }

    fn rasterize_triangle(
        &mut self,
        coords: &[(f32, f32, f32); 3],
        character: char,
        pick_id: Option<usize>,
    ) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Interpolate depth
                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                    self.pick_buffer[idx] = pick_id;
                }
            }
        }
    }

    /// Write the frame, tinting cells whose pick id falls in `highlight`.
    pub fn draw<W: Write>(&self, writer: &mut W, highlight: Option<Range<usize>>) -> std::io::Result<()> {
        for y in 0..self.height {
            writer.queue(MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];
                let selected = matches!(
                    (&highlight, self.pick_buffer[idx]),
                    (Some(range), Some(id)) if range.contains(&id)
                );

                // Color based on character intensity
                let color = match c {
                    _ if selected => Color::Yellow,
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
