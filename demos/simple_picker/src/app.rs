use makepad_widgets::*;
use makepad_location_picker::*;

live_design! {
    use link::theme::*;
    use link::shaders::*;
    use link::widgets::*;

    use makepad_location_picker::picker_view::LocationPickerView;

    App = {{App}} {
        ui: <Root> {
            main_window = <Window> {
                window: { title: "Makepad Location Picker" },
                body = <View> {
                    flow: Down,
                    spacing: 10,
                    padding: 20,

                    <Label> {
                        width: Fit, height: Fit
                        draw_text: {
                            text_style: { font_size: 18.0 }
                        }
                        text: "Pick a location"
                    }

                    picker = <LocationPickerView> {
                        width: 480,
                    }

                    status_label = <Label> {
                        width: Fill, height: Fit,
                        text: "Press Edit Location, then tap the map"
                        draw_text: {
                            text_style: { font_size: 12.0 }
                        }
                    }
                }
            }
        }
    }
}

app_main!(App);

#[derive(Live, LiveHook)]
pub struct App {
    #[live] ui: WidgetRef,
}

impl LiveRegister for App {
    fn live_register(cx: &mut Cx) {
        makepad_widgets::live_design(cx);
        makepad_location_picker::live_design(cx);
    }
}

impl MatchEvent for App {
    fn handle_startup(&mut self, cx: &mut Cx) {
        let picker = self.ui.location_picker_view(ids!(picker));
        picker.set_default_location(cx, Some(Coordinate::new(51.505, -0.09)));
        picker.set_on_save(|at| log::info!("Saved location: {}", at));
    }

    fn handle_actions(&mut self, cx: &mut Cx, actions: &Actions) {
        let picker = self.ui.location_picker_view(ids!(picker));
        if let Some(at) = picker.saved(actions) {
            self.ui
                .label(ids!(status_label))
                .set_text(cx, &format!("Saved {:.5}, {:.5}", at.lat, at.lng));
        }
    }
}

impl AppMain for App {
    fn handle_event(&mut self, cx: &mut Cx, event: &Event) {
        self.match_event(cx, event);
        self.ui.handle_event(cx, event, &mut Scope::empty());
    }
}
