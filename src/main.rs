fn main() {
    mch_tracker_lib::run()
}
