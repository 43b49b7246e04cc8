fn main() {
    env_logger::init();
    makepad_location_picker_demo::app_main()
}
