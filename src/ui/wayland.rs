use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_keyboard, delegate_output, delegate_pointer, delegate_registry,
    delegate_seat, delegate_shm, delegate_layer,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    seat::{
        keyboard::{KeyEvent, KeyboardHandler, Modifiers},
        pointer::{PointerEvent, PointerEventKind, PointerHandler, BTN_LEFT},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        wlr_layer::{
            LayerShell, LayerShellHandler, LayerSurface, LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{slot::SlotPool, Shm, ShmHandler},
};
use wayland_client::{
    globals::GlobalList,
    protocol::{wl_keyboard, wl_output, wl_pointer, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};
use xkbcommon::xkb::{self, keysyms};
use anyhow::{Context, Result};
use crate::clipboard::{self, CopyOutcome};
use crate::config::Config;
use crate::state::Session;
use crate::ui::layout::GridLayout;
use crate::ui::render::Renderer;

pub struct WaylandApp {
    pub registry_state: RegistryState,
    pub seat_state: SeatState,
    pub output_state: OutputState,
    pub compositor_state: CompositorState,
    pub shm_state: Shm,
    pub layer_shell_state: LayerShell,

    pub layer_surface: Option<LayerSurface>,
    pub pool: Option<SlotPool>,
    pub pointer: Option<wl_pointer::WlPointer>,
    pub width: u32,
    pub height: u32,
    pub first_configure: bool,
    pub should_exit: bool,

    pub config: Config,
    pub session: Session,
    pub renderer: Renderer,
    copy_tx: calloop::channel::Sender<CopyOutcome>,
}

impl WaylandApp {
    pub fn new(
        globals: &GlobalList,
        qh: &QueueHandle<Self>,
        config: Config,
        session: Session,
        renderer: Renderer,
        copy_tx: calloop::channel::Sender<CopyOutcome>,
    ) -> Result<Self> {
        let registry_state = RegistryState::new(globals);
        let seat_state = SeatState::new(globals, qh);
        let output_state = OutputState::new(globals, qh);
        let compositor_state = CompositorState::bind(globals, qh).context("wl_compositor not available")?;
        let shm_state = Shm::bind(globals, qh).context("wl_shm not available")?;
        let layer_shell_state = LayerShell::bind(globals, qh).context("zwlr_layer_shell_v1 not available")?;

        Ok(Self {
            registry_state,
            seat_state,
            output_state,
            compositor_state,
            shm_state,
            layer_shell_state,
            layer_surface: None,
            pool: None,
            pointer: None,
            width: config.theme.width,
            height: config.theme.height,
            first_configure: true,
            should_exit: false,
            config,
            session,
            renderer,
            copy_tx,
        })
    }

    pub fn draw(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>) {
        let Some(layer_surface) = &self.layer_surface else { return };
        let width = self.width;
        let height = self.height;
        if width == 0 || height == 0 { return; }

        let Some(pool) = self.pool.as_mut() else { return; };

        let (buffer, canvas) = match pool.create_buffer(
            width as i32,
            height as i32,
            (width * 4) as i32,
            wl_shm::Format::Argb8888,
        ) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Could not create shm buffer: {}", e);
                return;
            }
        };

        if let Some(mut pixmap) = tiny_skia::PixmapMut::from_bytes(canvas, width, height) {
            self.renderer.draw(&mut pixmap, &self.session, &self.config.theme);

            // RGBA -> BGRA for Argb8888
            for chunk in canvas.chunks_exact_mut(4) {
                chunk.swap(0, 2);
            }

            layer_surface.wl_surface().attach(Some(buffer.wl_buffer()), 0, 0);
            layer_surface.wl_surface().damage(0, 0, width as i32, height as i32);
            layer_surface.wl_surface().commit();
        }
    }

    fn request_redraw(&self, qh: &QueueHandle<Self>) {
        if let Some(layer_surface) = &self.layer_surface {
            layer_surface.wl_surface().frame(qh, layer_surface.wl_surface().clone());
            layer_surface.wl_surface().commit();
        }
    }

    fn layout(&self) -> GridLayout {
        GridLayout::compute(
            &self.config.theme,
            self.width as f32,
            self.height as f32,
            self.session.filtered_len(),
            self.session.selected_index,
        )
    }

    /// Starts copying the command of the card at `position` in the filtered
    /// view; the outcome arrives later through `finish_copy`.
    fn copy_command(&mut self, position: usize) {
        let Some(command) = self.session.filtered_get(position).map(|e| e.command.clone()) else {
            return;
        };

        self.session.copy_status = Some(format!("Copying: {}", command));
        let tx = self.copy_tx.clone();
        clipboard::copy_in_background(command, &self.config.general, move |outcome| {
            let _ = tx.send(outcome);
        });
    }

    pub fn finish_copy(&mut self, outcome: CopyOutcome) {
        match outcome.result {
            Ok(()) => {
                log::info!("Copied command: {}", outcome.text);
                self.session.copy_status = Some(format!("Copied: {}", outcome.text));
                if self.config.general.close_on_copy {
                    self.should_exit = true;
                }
            }
            Err(e) => {
                log::warn!("Copy failed: {:#}", e);
                self.session.copy_status = Some(format!("Copy failed: {}", e));
            }
        }
    }
}

impl LayerShellHandler for WaylandApp {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.should_exit = true;
    }

    fn configure(
        &mut self,
        conn: &Connection,
        qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        if configure.new_size.0 > 0 {
            self.width = configure.new_size.0;
        }
        if configure.new_size.1 > 0 {
            self.height = configure.new_size.1;
        }

        let needed = self.width as usize * self.height as usize * 4;
        if self.first_configure {
            self.first_configure = false;
            match SlotPool::new(needed, &self.shm_state) {
                Ok(pool) => self.pool = Some(pool),
                Err(e) => {
                    log::error!("Failed to create shm pool: {}", e);
                    self.should_exit = true;
                    return;
                }
            }
        }

        if let Some(pool) = &mut self.pool {
            if pool.len() < needed {
                if let Err(e) = pool.resize(needed) {
                    log::error!("Failed to resize shm pool: {}", e);
                    self.should_exit = true;
                    return;
                }
            }
        }

        self.draw(conn, qh);
    }
}

impl CompositorHandler for WaylandApp {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {}

    fn frame(
        &mut self,
        conn: &Connection,
        qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        self.draw(conn, qh);
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {}

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {}

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {}
}

impl OutputHandler for WaylandApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }
    fn new_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn update_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn output_destroyed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
}

impl SeatHandler for WaylandApp {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}

    fn new_capability(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        if capability == Capability::Keyboard {
            if let Err(e) = self.seat_state.get_keyboard(qh, &seat, None) {
                log::warn!("Failed to get keyboard: {}", e);
            }
        }
        if capability == Capability::Pointer && self.pointer.is_none() {
            match self.seat_state.get_pointer(qh, &seat) {
                Ok(pointer) => self.pointer = Some(pointer),
                Err(e) => log::warn!("Failed to get pointer: {}", e),
            }
        }
    }

    fn remove_capability(
        &mut self,
        _conn: &Connection,
        _: &QueueHandle<Self>,
        _: wl_seat::WlSeat,
        capability: Capability,
    ) {
        if capability == Capability::Pointer {
            if let Some(pointer) = self.pointer.take() {
                pointer.release();
            }
        }
    }

    fn remove_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}
}

impl KeyboardHandler for WaylandApp {
    fn enter(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
        _: &[u32],
        _: &[xkb::Keysym],
    ) {}

    fn leave(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
    ) {
        self.should_exit = true;
    }

    fn press_key(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        event: KeyEvent,
    ) {
        let columns = self.config.theme.columns;

        match u32::from(event.keysym) {
            keysyms::KEY_Escape => self.should_exit = true,
            keysyms::KEY_Return | keysyms::KEY_KP_Enter => {
                self.copy_command(self.session.selected_index);
            }
            keysyms::KEY_Up => self.session.move_vertical(-1, columns),
            keysyms::KEY_Down => self.session.move_vertical(1, columns),
            keysyms::KEY_Left | keysyms::KEY_ISO_Left_Tab => self.session.move_selection(-1),
            keysyms::KEY_Right | keysyms::KEY_Tab => self.session.move_selection(1),
            keysyms::KEY_BackSpace => self.session.pop_char(),
            _ => {
                if let Some(utf8) = event.utf8 {
                    if !utf8.is_empty() && !utf8.chars().any(|c| c.is_control()) {
                        self.session.push_str(&utf8);
                    }
                }
            }
        }

        self.request_redraw(qh);
    }

    fn release_key(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: u32,
        _: KeyEvent,
    ) {}

    fn update_modifiers(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _serial: u32,
        _modifiers: Modifiers,
        _layout: u32,
    ) {}
}

impl PointerHandler for WaylandApp {
    fn pointer_frame(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        _pointer: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        let mut dirty = false;
        for event in events {
            let on_surface = self
                .layer_surface
                .as_ref()
                .is_some_and(|l| l.wl_surface() == &event.surface);
            if !on_surface {
                continue;
            }

            if let PointerEventKind::Press { button, .. } = event.kind {
                if button != BTN_LEFT {
                    continue;
                }
                let (x, y) = event.position;
                if let Some(position) = self.layout().hit_test(x as f32, y as f32) {
                    self.session.select(position);
                    self.copy_command(position);
                    dirty = true;
                }
            }
        }

        if dirty {
            self.request_redraw(qh);
        }
    }
}

impl ShmHandler for WaylandApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm_state
    }
}

delegate_compositor!(WaylandApp);
delegate_output!(WaylandApp);
delegate_shm!(WaylandApp);
delegate_seat!(WaylandApp);
delegate_keyboard!(WaylandApp);
delegate_pointer!(WaylandApp);
delegate_layer!(WaylandApp);
delegate_registry!(WaylandApp);

impl ProvidesRegistryState for WaylandApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    fn runtime_add_global(&mut self, _: &Connection, _: &QueueHandle<Self>, _: u32, _: &str, _: u32) {
    }
    fn runtime_remove_global(&mut self, _: &Connection, _: &QueueHandle<Self>, _: u32, _: &str) {
    }
}
