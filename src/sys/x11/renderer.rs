use std::rc::Rc;

use anyhow::{Context, bail};
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{
    ChangeGCAux, Colormap, ConnectionExt as _, CreateGCAux, Font, Gcontext, Pixmap,
    QueryFontReply, Rectangle, Screen, Window,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::layout_engine::{DrawCommand, TextMeasure};
use crate::sys::geometry::{Rect, Size};
use crate::sys::window_server::Result;
use crate::ui::{ColorSpec, Renderer, Scheme};

const FALLBACK_FONT: &str = "fixed";

/// `ImageText8` carries at most this many bytes.
const MAX_TEXT_BYTES: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub background: u32,
    pub foreground: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub normal: ColorPair,
    pub selected: ColorPair,
}

impl Palette {
    fn pair(&self, scheme: Scheme) -> ColorPair {
        match scheme {
            Scheme::Normal => self.normal,
            Scheme::Selected => self.selected,
        }
    }
}

/// Allocates `[normal bg, normal fg, selected bg, selected fg]`.
pub fn alloc_palette(
    conn: &RustConnection,
    colormap: Colormap,
    specs: &[ColorSpec; 4],
) -> anyhow::Result<Palette> {
    let [nb, nf, sb, sf] = specs;
    Ok(Palette {
        normal: ColorPair {
            background: alloc_color(conn, colormap, nb)?,
            foreground: alloc_color(conn, colormap, nf)?,
        },
        selected: ColorPair {
            background: alloc_color(conn, colormap, sb)?,
            foreground: alloc_color(conn, colormap, sf)?,
        },
    })
}

fn alloc_color(conn: &RustConnection, colormap: Colormap, spec: &ColorSpec) -> anyhow::Result<u32> {
    let pixel = match spec {
        ColorSpec::Named(name) => {
            conn.alloc_named_color(colormap, name.as_bytes())?.reply().map(|r| r.pixel)
        }
        ColorSpec::Rgb(..) => {
            let (r, g, b) = spec.rgb16().unwrap_or_default();
            conn.alloc_color(colormap, r, g, b)?.reply().map(|r| r.pixel)
        }
    };
    pixel.with_context(|| format!("cannot allocate color '{spec}'"))
}

/// Per-glyph advance widths of a single-byte core font.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    ascent: u32,
    descent: u32,
    widths: Box<[u32; 256]>,
}

impl FontMetrics {
    /// `char_widths[i]` is the advance of byte `first_char + i`; bytes outside
    /// that range use `default_width`.
    pub fn from_glyphs(
        ascent: i16,
        descent: i16,
        first_char: u16,
        char_widths: &[i16],
        default_width: i16,
    ) -> Self {
        let clamp = |w: i16| u32::try_from(w).unwrap_or(0);
        let mut widths = Box::new([clamp(default_width); 256]);
        for (i, &w) in char_widths.iter().enumerate() {
            if let Some(slot) = widths.get_mut(usize::from(first_char) + i) {
                *slot = clamp(w);
            }
        }
        FontMetrics {
            ascent: clamp(ascent),
            descent: clamp(descent),
            widths,
        }
    }

    fn from_reply(reply: &QueryFontReply) -> Self {
        let fixed = reply.max_bounds.character_width;
        // Two-byte fonts whose first row is not row zero cannot be indexed
        // by latin-1 bytes; treat them as fixed width.
        if reply.char_infos.is_empty() || reply.min_byte1 != 0 {
            return Self::from_glyphs(reply.font_ascent, reply.font_descent, 0, &[], fixed);
        }
        let row = usize::from(reply.max_char_or_byte2.saturating_sub(reply.min_char_or_byte2)) + 1;
        let widths: Vec<i16> =
            reply.char_infos.iter().take(row).map(|info| info.character_width).collect();
        let default_width = reply
            .default_char
            .checked_sub(reply.min_char_or_byte2)
            .and_then(|i| widths.get(usize::from(i)).copied())
            .unwrap_or(0);
        Self::from_glyphs(
            reply.font_ascent,
            reply.font_descent,
            reply.min_char_or_byte2,
            &widths,
            default_width,
        )
    }

    pub fn height(&self) -> u32 { self.ascent + self.descent }

    pub fn text_width(&self, text: &str) -> u32 {
        encode_latin1(text).iter().map(|&b| self.widths[usize::from(b)]).sum()
    }
}

/// Core fonts index glyphs by latin-1 byte; anything else shows as `?`.
fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars().map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?')).collect()
}

fn try_open_font(conn: &RustConnection, name: &str) -> anyhow::Result<Option<Font>> {
    let font = conn.generate_id()?;
    match conn.open_font(font, name.as_bytes())?.check() {
        Ok(()) => Ok(Some(font)),
        Err(ReplyError::X11Error(err)) => {
            warn!("cannot load font '{name}': {:?}", err.error_kind);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn load_font(conn: &RustConnection, name: &str) -> anyhow::Result<(Font, FontMetrics)> {
    let font = match try_open_font(conn, name)? {
        Some(font) => font,
        None => match try_open_font(conn, FALLBACK_FONT)? {
            Some(font) => {
                warn!("using fallback font '{FALLBACK_FONT}'");
                font
            }
            None => bail!("cannot load font: '{name}'"),
        },
    };
    let reply = conn.query_font(font)?.reply().context("querying font metrics")?;
    let metrics = FontMetrics::from_reply(&reply);
    debug!(height = metrics.height(), "loaded font");
    Ok((font, metrics))
}

/// Draws the bar into a pixmap with core-protocol requests and copies it to
/// the frame.
pub struct X11Renderer {
    conn: Rc<RustConnection>,
    root: Window,
    frame: Window,
    depth: u8,
    font: Font,
    gc: Gcontext,
    buffer: Pixmap,
    metrics: FontMetrics,
    palette: Palette,
}

impl X11Renderer {
    pub fn new(
        conn: Rc<RustConnection>,
        screen: &Screen,
        frame: Window,
        font_name: &str,
        palette: Palette,
        size: Size,
    ) -> anyhow::Result<Self> {
        let (font, metrics) = load_font(&conn, font_name)?;

        let gc = conn.generate_id()?;
        conn.create_gc(gc, screen.root, &CreateGCAux::new().font(font))?;

        let buffer = conn.generate_id()?;
        conn.create_pixmap(
            screen.root_depth,
            buffer,
            screen.root,
            size.width.max(1) as u16,
            size.height.max(1) as u16,
        )?;

        Ok(X11Renderer {
            conn,
            root: screen.root,
            frame,
            depth: screen.root_depth,
            font,
            gc,
            buffer,
            metrics,
            palette,
        })
    }
}

impl TextMeasure for X11Renderer {
    fn text_width(&self, text: &str) -> u32 { self.metrics.text_width(text) }

    fn font_height(&self) -> u32 { self.metrics.height() }

    fn font_ascent(&self) -> u32 { self.metrics.ascent }
}

impl Renderer for X11Renderer {
    fn resize_buffer(&mut self, size: Size) -> Result<()> {
        self.conn.free_pixmap(self.buffer)?;
        self.buffer = self.conn.generate_id()?;
        self.conn.create_pixmap(
            self.depth,
            self.buffer,
            self.root,
            size.width.max(1) as u16,
            size.height.max(1) as u16,
        )?;
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> Result<()> {
        let colors = self.palette.pair(command.scheme);
        let rect = command.rect;

        self.conn.change_gc(self.gc, &ChangeGCAux::new().foreground(colors.background))?;
        self.conn.poly_fill_rectangle(
            self.buffer,
            self.gc,
            &[Rectangle {
                x: rect.x as i16,
                y: rect.y as i16,
                width: rect.width as u16,
                height: rect.height as u16,
            }],
        )?;

        if let Some(text) = &command.text {
            let mut bytes = encode_latin1(text);
            bytes.truncate(MAX_TEXT_BYTES);
            self.conn.change_gc(
                self.gc,
                &ChangeGCAux::new().foreground(colors.foreground).background(colors.background),
            )?;
            self.conn.image_text8(
                self.buffer,
                self.gc,
                command.origin.x as i16,
                command.origin.baseline as i16,
                &bytes,
            )?;
        }
        Ok(())
    }

    fn present(&mut self, rect: Rect) -> Result<()> {
        self.conn.copy_area(
            self.buffer,
            self.frame,
            self.gc,
            rect.x as i16,
            rect.y as i16,
            rect.x as i16,
            rect.y as i16,
            rect.width as u16,
            rect.height as u16,
        )?;
        self.conn.sync()?;
        Ok(())
    }
}

impl Drop for X11Renderer {
    fn drop(&mut self) {
        // The connection may already be broken; nothing to do about it here.
        _ = self.conn.free_pixmap(self.buffer);
        _ = self.conn.free_gc(self.gc);
        _ = self.conn.close_font(self.font);
        _ = self.conn.flush();
    }
}
