/// Receives the file-style names (`pkg/FooTest.class`) of test classes.
pub trait TestClassSink {
    fn process_test_class(&mut self, test_class_name: &str);
}

impl TestClassSink for Vec<String> {
    fn process_test_class(&mut self, test_class_name: &str) {
        self.push(test_class_name.to_string());
    }
}

impl<S: TestClassSink + ?Sized> TestClassSink for &mut S {
    fn process_test_class(&mut self, test_class_name: &str) {
        (**self).process_test_class(test_class_name);
    }
}
